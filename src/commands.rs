//! Recognition of shell commands inside assistant replies

/// Prefixes that mark a line as a copyable command. Matching is
/// case-sensitive and includes the trailing space.
pub const COMMAND_PREFIXES: [&str; 5] = ["kubectl ", "docker ", "helm ", "k9s ", "minikube "];

/// Starter prompts offered to the user
pub const SUGGESTIONS: [&str; 6] = [
    "kubectl get pods",
    "docker ps",
    "How do I debug a crashloop?",
    "Show me a deployment YAML",
    "kubectl logs troubleshooting",
    "docker container optimization",
];

/// Whether a single line (already trimmed) starts with a recognized prefix
pub fn is_command_line(line: &str) -> bool {
    COMMAND_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Collect every line of `content` whose trimmed text is a command, in order.
pub fn extract_commands(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| is_command_line(line))
        .map(str::to_string)
        .collect()
}

/// First copyable command in `content`, if any
pub fn first_command(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| is_command_line(line))
        .map(str::to_string)
}

/// Whether content carries fenced or inline command code
pub fn has_code_block(content: &str) -> bool {
    content.contains("```") || content.contains("`kubectl") || content.contains("`docker")
}

/// 1-based lookup into [`SUGGESTIONS`]
pub fn suggestion(index: usize) -> Option<&'static str> {
    index.checked_sub(1).and_then(|i| SUGGESTIONS.get(i)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_commands_in_order() {
        assert_eq!(
            extract_commands("kubectl get pods\nhello\ndocker ps"),
            vec!["kubectl get pods".to_string(), "docker ps".to_string()]
        );
    }

    #[test]
    fn no_commands_yields_empty() {
        assert!(extract_commands("no commands here").is_empty());
        assert_eq!(first_command("no commands here"), None);
    }

    #[test]
    fn indented_lines_are_trimmed() {
        let content = "Run this:\n    helm install web ./chart  \n\tminikube start\r\n";
        assert_eq!(
            extract_commands(content),
            vec!["helm install web ./chart", "minikube start"]
        );
    }

    #[test]
    fn prefix_requires_trailing_space_and_case() {
        assert!(extract_commands("kubectl\nKubectl get pods\nkubectlget\ndockerd run").is_empty());
        assert_eq!(extract_commands("k9s -n default"), vec!["k9s -n default"]);
    }

    #[test]
    fn first_command_follows_traversal_order() {
        let content = "Try:\n\n```\ndocker ps -a\nkubectl get pods\n```";
        assert_eq!(first_command(content).as_deref(), Some("docker ps -a"));
    }

    #[test]
    fn detects_code_blocks() {
        assert!(has_code_block("```yaml\nkind: Pod\n```"));
        assert!(has_code_block("run `kubectl get ns`"));
        assert!(!has_code_block("plain text"));
    }

    #[test]
    fn suggestions_are_one_based() {
        assert_eq!(suggestion(1), Some("kubectl get pods"));
        assert_eq!(suggestion(6), Some("docker container optimization"));
        assert_eq!(suggestion(0), None);
        assert_eq!(suggestion(7), None);
    }
}
