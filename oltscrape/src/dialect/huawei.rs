//! Huawei SmartAX (MA56xx / MA58xx) OLT dialect.
//!
//! # Prompt Examples
//!
//! ```text
//! MA5800-X7>                         # user mode
//! MA5800-X7#                         # privileged mode
//! MA5800-X7(config)#                 # global config
//! MA5800-X7(config-if-gpon-0/2)#     # GPON board interface
//! ```
//!
//! # Context Graph
//!
//! ```text
//! ┌──────┐  enable  ┌────────────┐  config  ┌──────────┐  interface gpon 0/N  ┌───────────────┐
//! │ user ├─────────►│ privileged ├─────────►│  config  ├─────────────────────►│ interface 0/N │
//! │  >   │          │     #      │          │(config)# │◄─────────────────────┤(config-if-..)#│
//! └──────┘          └────────────┘          └──────────┘        quit          └───────────────┘
//! ```

use regex::bytes::Regex;

use super::Dialect;
use crate::channel::CompiledPrompt;

/// Create the Huawei SmartAX dialect definition.
pub fn smartax() -> Dialect {
    let any_prompt =
        Regex::new(r"(?m)^[ \t]*[\w.\-]+(?:\([\w.\-/]+\))?[>#][ \t]*$").unwrap();

    let user_prompt = CompiledPrompt::new(r"(?m)^[ \t]*[\w.\-]+>[ \t]*$").unwrap();

    // "#" alone also ends config prompts; not_contains keeps them apart
    let privileged_prompt =
        CompiledPrompt::with_not_contains(r"(?m)^[ \t]*[\w.\-]+#[ \t]*$", vec!["(config".into()])
            .unwrap();

    let config_prompt = CompiledPrompt::new(r"(?m)^[ \t]*[\w.\-]+\(config\)#[ \t]*$").unwrap();

    let interface_capture = Regex::new(r"\(config-if-gpon-(\d+)/(\d+)\)#").unwrap();

    Dialect {
        name: "huawei_smartax".to_string(),
        frame: "0".to_string(),
        any_prompt,
        user_prompt,
        privileged_prompt,
        config_prompt,
        interface_capture,
        interface_prompt_template: r"(?m)^[ \t]*[\w.\-]+\(config-if-gpon-{frame}/{board}\)#[ \t]*$"
            .to_string(),
        elevate_command: "enable".to_string(),
        config_command: "config".to_string(),
        interface_command_template: "interface gpon {frame}/{board}".to_string(),
        exit_interface_command: "quit".to_string(),
        on_open_commands: vec![],
        failed_when_contains: vec![],
        pager: Some(Regex::new(r"-+ ?More \( Press 'Q' to quit \) ?-+").unwrap()),
        continuation: Some(Regex::new(r"\{[^{}\n]*<cr>[^{}\n]*\}:[ \t]*$").unwrap()),
    }
    .with_on_open_command("undo smart")
    .with_on_open_command("scroll")
    .with_failure_pattern("% Unknown command")
    .with_failure_pattern("% Parameter error")
    .with_failure_pattern("% Incomplete command")
    .with_failure_pattern("% Ambiguous command")
    .with_failure_pattern("% Too many parameters")
    .with_failure_pattern("Failure:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PromptMatcher;
    use crate::dialect::PromptKind;

    #[test]
    fn test_smartax_dialect() {
        let dialect = smartax();
        assert_eq!(dialect.name, "huawei_smartax");
        assert_eq!(dialect.frame, "0");
        assert_eq!(dialect.on_open_commands, vec!["undo smart", "scroll"]);
        assert!(!dialect.failed_when_contains.is_empty());
    }

    #[test]
    fn test_classify_prompts() {
        let dialect = smartax();
        assert_eq!(dialect.classify("MA5800-X7>"), Some(PromptKind::User));
        assert_eq!(dialect.classify("MA5800-X7#"), Some(PromptKind::Privileged));
        assert_eq!(dialect.classify("MA5800-X7(config)#"), Some(PromptKind::Config));
        assert_eq!(
            dialect.classify("MA5800-X7(config-if-gpon-0/2)#"),
            Some(PromptKind::Interface("2".into()))
        );
        assert_eq!(dialect.classify("some output line"), None);
    }

    #[test]
    fn test_privileged_does_not_match_config() {
        let dialect = smartax();
        assert!(dialect.privileged_prompt.is_match(b"OLT_NORTE#"));
        assert!(!dialect.privileged_prompt.is_match(b"OLT_NORTE(config)#"));
        assert!(!dialect.privileged_prompt.is_match(b"OLT_NORTE(config-if-gpon-0/1)#"));
    }

    #[test]
    fn test_any_prompt_ignores_echo_lines() {
        let dialect = smartax();
        assert!(dialect.any_prompt.is_match(b"output\nMA5800-X7(config)# "));
        assert!(dialect.any_prompt.is_match(b"\n   MA5800-X7(config-if-gpon-0/4)#"));
        assert!(!dialect.any_prompt.is_match(b"MA5800-X7(config)#display board 0/2"));
    }

    #[test]
    fn test_interface_prompt_is_board_specific() {
        let dialect = smartax();
        let prompt = dialect.interface_prompt("4").unwrap();
        assert!(prompt.is_match(b"MA5800-X7(config-if-gpon-0/4)#"));
        assert!(!prompt.is_match(b"MA5800-X7(config-if-gpon-0/5)#"));
        assert!(!prompt.is_match(b"MA5800-X7(config-if-gpon-0/14)#"));
        assert_eq!(dialect.interface_command("4"), "interface gpon 0/4");
    }

    #[test]
    fn test_pager_and_continuation_markers() {
        let dialect = smartax();
        let pager = dialect.pager.unwrap();
        assert!(pager.is_match(b"  ---- More ( Press 'Q' to quit ) ----"));

        let continuation = dialect.continuation.unwrap();
        assert!(continuation.is_match(b"display ont info summary 0\n{ <cr>||<K> }:"));
        assert!(!continuation.is_match(b"{ <cr>||<K> }:\n"));
    }

    #[test]
    fn test_normalize_output() {
        let dialect = smartax();
        let raw = "display board 0/2 | include port\n  In port 0/ 2/0 , the total of ONTs are: 3, online: 2\nMA5800-X7(config)#";
        assert_eq!(
            dialect.normalize_output(raw, "display board 0/2 | include port"),
            "  In port 0/ 2/0 , the total of ONTs are: 3, online: 2"
        );

        assert_eq!(dialect.normalize_output("quit\nMA5800-X7(config)#", "quit"), "");
    }

    #[test]
    fn test_detect_failure() {
        let dialect = smartax();
        assert_eq!(
            dialect.detect_failure("                  ^\n  % Unknown command, the error locates at '^'"),
            Some("% Unknown command".to_string())
        );
        assert_eq!(dialect.detect_failure("In port 0/2/0, ..."), None);
    }
}
