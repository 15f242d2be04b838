//! Command definitions for the study timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Study timer CLI - focused study sessions with credited minutes
#[derive(Parser, Debug)]
#[command(
    name = "studytimer",
    version,
    about = "Focus timer for study sessions",
    long_about = "A countdown timer for focused study sessions.\n\
                  Finished sessions credit whole minutes of study time to a\n\
                  local or remote study log; pauses never count.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a new session, or resume a paused one
    Start(StartArgs),

    /// Pause the running countdown
    Pause,

    /// Resume a paused countdown
    Resume,

    /// Reset to idle without crediting any time
    Reset,

    /// Finish the session and credit elapsed minutes
    Finish,

    /// Show current timer status
    Status,

    /// Show the accumulated study log
    Log,

    /// Run as daemon (background service)
    #[command(hide = true)]
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Start Command Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Planned duration in minutes (1-60, configured default when omitted)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub minutes: Option<u32>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Cli Tests
    // ------------------------------------------------------------------------

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["studytimer"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
        }

        #[test]
        fn test_parse_verbose_flag() {
            let cli = Cli::parse_from(["studytimer", "--verbose"]);
            assert!(cli.verbose);
        }

        #[test]
        fn test_parse_status_command() {
            let cli = Cli::parse_from(["studytimer", "status"]);
            assert!(matches!(cli.command, Some(Commands::Status)));
        }

        #[test]
        fn test_parse_pause_command() {
            let cli = Cli::parse_from(["studytimer", "pause"]);
            assert!(matches!(cli.command, Some(Commands::Pause)));
        }

        #[test]
        fn test_parse_resume_command() {
            let cli = Cli::parse_from(["studytimer", "resume"]);
            assert!(matches!(cli.command, Some(Commands::Resume)));
        }

        #[test]
        fn test_parse_reset_command() {
            let cli = Cli::parse_from(["studytimer", "reset"]);
            assert!(matches!(cli.command, Some(Commands::Reset)));
        }

        #[test]
        fn test_parse_finish_command() {
            let cli = Cli::parse_from(["studytimer", "finish"]);
            assert!(matches!(cli.command, Some(Commands::Finish)));
        }

        #[test]
        fn test_parse_log_command() {
            let cli = Cli::parse_from(["studytimer", "log"]);
            assert!(matches!(cli.command, Some(Commands::Log)));
        }

        #[test]
        fn test_parse_daemon_command() {
            let cli = Cli::parse_from(["studytimer", "daemon"]);
            assert!(matches!(cli.command, Some(Commands::Daemon)));
        }

        #[test]
        fn test_parse_completions_shells() {
            for (name, shell) in [
                ("bash", clap_complete::Shell::Bash),
                ("zsh", clap_complete::Shell::Zsh),
                ("fish", clap_complete::Shell::Fish),
            ] {
                let cli = Cli::parse_from(["studytimer", "completions", name]);
                match cli.command {
                    Some(Commands::Completions { shell: parsed }) => assert_eq!(parsed, shell),
                    _ => panic!("Expected Completions command"),
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Start Command Tests
    // ------------------------------------------------------------------------

    mod start_args_tests {
        use super::*;

        #[test]
        fn test_parse_start_without_minutes() {
            let cli = Cli::parse_from(["studytimer", "start"]);
            match cli.command {
                Some(Commands::Start(args)) => assert!(args.minutes.is_none()),
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_parse_start_minutes() {
            let cli = Cli::parse_from(["studytimer", "start", "--minutes", "40"]);
            match cli.command {
                Some(Commands::Start(args)) => assert_eq!(args.minutes, Some(40)),
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_parse_start_minutes_short() {
            let cli = Cli::parse_from(["studytimer", "start", "-m", "5"]);
            match cli.command {
                Some(Commands::Start(args)) => assert_eq!(args.minutes, Some(5)),
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_parse_start_boundaries() {
            for minutes in ["1", "60"] {
                let result = Cli::try_parse_from(["studytimer", "start", "--minutes", minutes]);
                assert!(result.is_ok(), "minutes {} should parse", minutes);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Error Case Tests (using try_parse)
    // ------------------------------------------------------------------------

    mod error_tests {
        use super::*;

        #[test]
        fn test_parse_start_minutes_too_low() {
            let result = Cli::try_parse_from(["studytimer", "start", "--minutes", "0"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_start_minutes_too_high() {
            let result = Cli::try_parse_from(["studytimer", "start", "--minutes", "61"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_start_minutes_not_number() {
            let result = Cli::try_parse_from(["studytimer", "start", "--minutes", "abc"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_unknown_command() {
            let result = Cli::try_parse_from(["studytimer", "unknown"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_completions_invalid_shell() {
            let result = Cli::try_parse_from(["studytimer", "completions", "invalid"]);
            assert!(result.is_err());
        }
    }
}
