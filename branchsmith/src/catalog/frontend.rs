//! `frontend` catalog: component, hook, and docs branches plus the initial
//! scaffold task.

use crate::core::types::{CommitStep, Task};

pub const COMPONENTS: &[&str] = &[
    "Header",
    "Footer",
    "Grid",
    "Pixel",
    "Toolbar",
    "WalletModal",
    "TransactionList",
    "StatsPanel",
    "Notification",
    "ColorPicker",
    "Instructions",
    "AdminPanel",
    "Sidebar",
    "Search",
    "Filter",
    "UserCard",
    "Leaderboard",
    "ActivityFeed",
    "Settings",
    "About",
    "Modal",
    "Button",
    "Input",
    "Tooltip",
    "Dropdown",
    "Checkbox",
    "Radio",
    "Toggle",
    "ProgressBar",
    "Badge",
    "Alert",
    "Spinner",
    "Avatar",
    "Breadcrumb",
    "Pagination",
    "Tabs",
    "Accordion",
    "Card",
    "Skeleton",
    "EmptyState",
    "Divider",
    "AvatarGroup",
    "Stat",
    "Icon",
];

pub const HOOKS: &[&str] = &[
    "usePixel",
    "useCanvas",
    "useWallet",
    "useTransactions",
    "useNotifications",
    "useWindowSize",
    "useClickOutside",
    "useFetchCanvas",
    "useUserStats",
    "useDebounce",
    "useLocalStorage",
    "useAuth",
    "useRegistry",
    "useContract",
    "useEvents",
    "useInterval",
    "usePrevious",
    "useToggle",
    "useLockedBody",
    "useMediaQuery",
];

pub const DOCS: &[&str] = &[
    "Technical_Architecture",
    "Deployment_Strategy",
    "User_Experience",
    "Security_Analysis",
    "Contribution_Workflow",
    "API_Reference",
    "Smart_Contract_Audit",
    "Frontend_State_Machine",
    "E2E_Testing_Plan",
    "Performance_Optimization",
    "Accessibility_Standards",
    "Brand_Guidelines",
    "Roadmap",
    "Privacy_Policy",
    "Terms_of_Service",
];

/// Components, then hooks, then docs, then `core/init-frontend`.
pub fn frontend_catalog() -> Vec<Task> {
    let mut tasks = Vec::with_capacity(COMPONENTS.len() + HOOKS.len() + DOCS.len() + 1);
    tasks.extend(COMPONENTS.iter().map(|name| component_task(name)));
    tasks.extend(HOOKS.iter().map(|name| hook_task(name)));
    tasks.extend(DOCS.iter().map(|name| docs_task(name)));
    tasks.push(init_frontend_task());
    tasks
}

fn component_task(c: &str) -> Task {
    let lower = c.to_lowercase();
    let dir = format!("src/components/{c}");
    let types = format!("{dir}/types.ts");
    let view = format!("{dir}/{c}.tsx");
    let readme = format!("{dir}/README.md");

    let aria = format!("<div aria-label=\"{c}\">");
    let variant = format!("\nexport type {c}Variant = \"primary\" | \"secondary\";");
    let usage = format!("\n\n```tsx\n<{c} />\n```");

    Task::new(
        format!("frontend/component-{lower}"),
        format!("feat: implement {c} component"),
        format!("Modular {c} component with high detail."),
    )
    .with_step(CommitStep::new(format!("feat: mkdir {dir}")).in_directory(&dir))
    .with_step(
        CommitStep::new(format!("feat: add {c} interface"))
            .with_literal(&types, format!("export interface {c}Props {{}}")),
    )
    .with_step(
        CommitStep::new(format!("feat: add {c} base structure")).with_literal(
            &view,
            format!(
                "import React from 'react';\nimport './{c}.css';\n\nexport const {c}: React.FC = () => <div>{c}</div>;"
            ),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: add CSS for {c}"))
            .with_literal(format!("{dir}/{c}.css"), format!(".{lower} {{ display: block; }}")),
    )
    .with_step(
        CommitStep::new(format!("feat: add accessibility tags to {c}")).with_transform(
            &view,
            "replace <div> with labelled <div>",
            move |cur| cur.replacen("<div>", &aria, 1),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: add variants to {c} types")).with_transform(
            &types,
            "append variant type",
            move |cur| format!("{cur}{variant}"),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: implement {c} logic")).with_transform(
            &view,
            "add props parameter",
            |cur| cur.replacen("() =>", "(props: any) =>", 1),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: add documentation for {c}"))
            .with_literal(&readme, format!("# {c} Component\nDescription of {c}.")),
    )
    .with_step(
        CommitStep::new(format!("feat: add usage example for {c}")).with_transform(
            &readme,
            "append usage example",
            move |cur| format!("{cur}{usage}"),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: export {c} from index")).with_literal(
            format!("{dir}/index.ts"),
            format!("export * from './{c}';\nexport * from './types';"),
        ),
    )
}

fn hook_task(h: &str) -> Task {
    let file = format!("src/hooks/{h}.ts");
    let types_header = format!("// Types for {h}\n");
    let export_line = format!("export * from './{h}';\n");
    let doc_header = format!("/**\n * {h} hook description\n */\n");

    Task::new(
        format!("frontend/hook-{}", h.to_lowercase()),
        format!("feat: implement {h} hook"),
        format!("Custom React hook {h}."),
    )
    .with_step(
        CommitStep::new(format!("feat: create {h}.ts"))
            .with_literal(&file, format!("export const {h} = () => {{}};")),
    )
    .with_step(
        CommitStep::new(format!("feat: add type definitions for {h}")).with_transform(
            &file,
            "prepend types comment",
            move |cur| format!("{types_header}{cur}"),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: add state to {h}")).with_transform(
            &file,
            "add state",
            |cur| {
                cur.replacen(
                    "() => {}",
                    "() => {\n  const [state, setState] = useState();\n}",
                    1,
                )
            },
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: add effect to {h}")).with_transform(
            &file,
            "add effect",
            |cur| cur.replacen('}', "  useEffect(() => {}, []);\n}", 1),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: add return value to {h}")).with_transform(
            &file,
            "add return",
            |cur| cur.replacen('}', "  return state;\n}", 1),
        ),
    )
    .with_step(
        CommitStep::new(format!("feat: export {h} from hooks index")).with_transform(
            "src/hooks/index.ts",
            "append export",
            move |cur| format!("{cur}{export_line}"),
        ),
    )
    .with_step(
        CommitStep::new(format!("docs: add comment for {h}")).with_transform(
            &file,
            "prepend doc comment",
            move |cur| format!("{doc_header}{cur}"),
        ),
    )
    .with_step(
        CommitStep::new(format!("test: add placeholder test for {h}")).with_literal(
            format!("src/hooks/__tests__/{h}.test.ts"),
            format!("describe('{h}', () => {{ it('works', () => {{}}) }})"),
        ),
    )
}

fn docs_task(d: &str) -> Task {
    let title = d.replace('_', " ");
    let file = format!("docs/{d}.md");
    let intro = format!("\n## Introduction\nOverview of {d}");
    let details = format!("\n## Details\nDeep dive into {d}");
    let sidebar_entry = format!("\n- [{title}](docs/{d}.md)");

    Task::new(
        format!("docs/{}", d.to_lowercase()),
        format!("docs: add {title}"),
        format!("Comprehensive documentation for {d}."),
    )
    .with_step(CommitStep::new(format!("docs: create {d}.md")).with_literal(&file, format!("# {title}\n")))
    .with_step(
        CommitStep::new(format!("docs: add introduction to {d}")).with_transform(
            &file,
            "append introduction",
            move |cur| format!("{cur}{intro}"),
        ),
    )
    .with_step(
        CommitStep::new(format!("docs: add detailed sections to {d}")).with_transform(
            &file,
            "append details",
            move |cur| format!("{cur}{details}"),
        ),
    )
    .with_step(
        CommitStep::new(format!("docs: add conclusion to {d}")).with_transform(
            &file,
            "append conclusion",
            |cur| format!("{cur}\n## Conclusion\nSummary."),
        ),
    )
    .with_step(
        CommitStep::new(format!("docs: update sidebar for {d}")).with_transform(
            "docs/_sidebar.md",
            "append sidebar entry",
            move |cur| format!("{cur}{sidebar_entry}"),
        ),
    )
}

fn init_frontend_task() -> Task {
    let files: [(&str, &str, &str); 10] = [
        (
            "chore: init vite config",
            "vite.config.ts",
            "import { defineConfig } from \"vite\";\nexport default defineConfig({});",
        ),
        (
            "chore: init tsconfig.json",
            "tsconfig.json",
            "{ \"compilerOptions\": { \"target\": \"ESNext\" } }",
        ),
        (
            "feat: add index.html",
            "index.html",
            "<!DOCTYPE html><html><body><div id=\"root\"></div></body></html>",
        ),
        (
            "feat: add main entry point",
            "src/main.tsx",
            "import React from \"react\";\nimport ReactDOM from \"react-dom/client\";",
        ),
        (
            "feat: add App component",
            "src/App.tsx",
            "export const App = () => <div>Hello</div>;",
        ),
        (
            "style: add root CSS",
            "src/index.css",
            ":root { font-family: Inter; }",
        ),
        ("feat: add favicon", "public/favicon.ico", ""),
        ("feat: add robots.txt", "public/robots.txt", "User-agent: *"),
        ("feat: add manifest.json", "public/manifest.json", "{}"),
        (
            "feat: add environment env.example",
            ".env.example",
            "STX_NETWORK=testnet",
        ),
    ];

    let mut task = Task::new(
        "core/init-frontend",
        "feat: initialize frontend structure",
        "Setting up the base frontend architecture.",
    );
    for (message, path, content) in files {
        task = task.with_step(CommitStep::new(message).with_literal(path, content));
    }
    task.with_step(
        CommitStep::new("docs: update README with frontend info").with_transform(
            "README.md",
            "append frontend section",
            |cur| format!("{cur}\n## Frontend\nReact + Vite."),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::worktree::MemoryWorkingTree;
    use crate::mutate::apply_step;

    fn replay(task: &Task, tree: &MemoryWorkingTree) {
        for step in &task.steps {
            assert!(apply_step(step, tree).is_clean(), "{}", step.message);
        }
    }

    #[test]
    fn catalog_shape() {
        let tasks = frontend_catalog();
        assert_eq!(tasks.len(), COMPONENTS.len() + HOOKS.len() + DOCS.len() + 1);
        assert_eq!(tasks[0].name, "frontend/component-header");
        assert_eq!(tasks[0].steps.len(), 10);
        assert_eq!(tasks[COMPONENTS.len()].steps.len(), 8);
        assert_eq!(tasks[COMPONENTS.len() + HOOKS.len()].steps.len(), 5);
        let last = tasks.last().expect("last");
        assert_eq!(last.name, "core/init-frontend");
        assert_eq!(last.steps.len(), 11);
    }

    #[test]
    fn component_steps_compose() {
        let tree = MemoryWorkingTree::new();
        replay(&component_task("Button"), &tree);
        assert_eq!(
            tree.file("src/components/Button/Button.tsx").as_deref(),
            Some(
                "import React from 'react';\nimport './Button.css';\n\nexport const Button: React.FC = (props: any) => <div aria-label=\"Button\">Button</div>;"
            )
        );
        assert_eq!(
            tree.file("src/components/Button/README.md").as_deref(),
            Some("# Button Component\nDescription of Button.\n\n```tsx\n<Button />\n```")
        );
    }

    #[test]
    fn hook_steps_replace_first_brace_only() {
        let tree = MemoryWorkingTree::new();
        replay(&hook_task("useInterval"), &tree);
        let expected = "/**\n * useInterval hook description\n */\n// Types for useInterval\nexport const useInterval = () => {\n  const [state, setState] = useState();\n  useEffect(() => {  return state;\n}, []);\n};";
        assert_eq!(tree.file("src/hooks/useInterval.ts").as_deref(), Some(expected));
        assert_eq!(
            tree.file("src/hooks/index.ts").as_deref(),
            Some("export * from './useInterval';\n")
        );
    }

    #[test]
    fn docs_append_sections_and_sidebar() {
        let tree = MemoryWorkingTree::new().with_file("docs/_sidebar.md", "# Docs");
        replay(&docs_task("API_Reference"), &tree);
        assert_eq!(
            tree.file("docs/API_Reference.md").as_deref(),
            Some("# API Reference\n\n## Introduction\nOverview of API_Reference\n## Details\nDeep dive into API_Reference\n## Conclusion\nSummary.")
        );
        assert_eq!(
            tree.file("docs/_sidebar.md").as_deref(),
            Some("# Docs\n- [API Reference](docs/API_Reference.md)")
        );
    }
}
