//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::CliArgs;

/// pageforge - generate single-page HTML documents with an LLM
#[derive(Parser, Debug)]
#[command(name = "pageforge")]
#[command(about = "Plan, generate, validate and repair a single HTML page from one goal")]
#[command(long_about = r#"
pageforge turns a one-line description into a complete HTML page. It plans the
page in five parts, generates each part, combines them, asks the model to review
the result and repairs it when the review finds errors.

EXAMPLES:
  # Generate a page with the default local Ollama model
  pageforge generate "a landing page for a bakery"

  # Print the page instead of writing it
  pageforge generate "a blog about tea" --print

  # Use Anthropic and allow up to two repair rounds
  pageforge --provider anthropic --model claude-sonnet-4 \
            --max-repairs 2 --revalidate generate "an online shop for socks"

  # Inspect the plan only
  pageforge plan "an admin dashboard"

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  The config file is discovered by searching upward from CWD for .pageforge/config.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Generation service provider: ollama or anthropic (default: ollama)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model to use (default: qwen3-coder)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Attempts per service call before giving up (default: 5)
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Timeout of a single service call in seconds (default: 180)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Maximum repairs per run (default: 1)
    #[arg(long, global = true)]
    pub max_repairs: Option<u32>,

    /// Validate again after each repair
    #[arg(long, global = true)]
    pub revalidate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a page and write it to disk
    Generate {
        /// Description of the page to build
        goal: String,

        /// Output file (default: generated_page.html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the page to stdout instead of writing a file
        #[arg(long, conflicts_with_all = ["output", "json"])]
        print: bool,

        /// Print the run report as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Classify the goal and print the synthesized plan
    Plan {
        /// Description of the page to plan
        goal: String,
    },

    /// Print the category and planning guidance for a goal (no service call)
    Classify {
        /// Description of the page
        goal: String,
    },

    /// Show the effective configuration and where each value came from
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Configuration overrides taken from the command line.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        let output_path = match &self.command {
            Commands::Generate { output, .. } => output.clone(),
            _ => None,
        };
        CliArgs {
            config_path: self.config.clone(),
            llm_provider: self.provider.clone(),
            model: self.model.clone(),
            max_attempts: self.max_attempts,
            timeout_secs: self.timeout_secs,
            max_repairs: self.max_repairs,
            revalidate: self.revalidate.then_some(true),
            output_path,
        }
    }

    /// Short name of the subcommand, for error reporting.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self.command {
            Commands::Generate { .. } => "generate",
            Commands::Plan { .. } => "plan",
            Commands::Classify { .. } => "classify",
            Commands::Config { .. } => "config",
        }
    }
}

/// Build the clap command, for help rendering and tests.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_global_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "pageforge",
            "--model",
            "llama3",
            "--max-attempts",
            "2",
            "--revalidate",
            "generate",
            "a blog",
            "--output",
            "out.html",
        ])
        .unwrap();

        let args = cli.to_cli_args();
        assert_eq!(args.model.as_deref(), Some("llama3"));
        assert_eq!(args.max_attempts, Some(2));
        assert_eq!(args.revalidate, Some(true));
        assert_eq!(args.output_path, Some(PathBuf::from("out.html")));
        assert_eq!(cli.operation(), "generate");
    }

    #[test]
    fn test_absent_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["pageforge", "plan", "a shop"]).unwrap();
        let args = cli.to_cli_args();
        assert!(args.model.is_none());
        assert!(args.revalidate.is_none());
        assert!(args.output_path.is_none());
    }

    #[test]
    fn test_print_conflicts_with_output() {
        let result = Cli::try_parse_from([
            "pageforge", "generate", "x", "--print", "--output", "a.html",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_goal_is_required() {
        assert!(Cli::try_parse_from(["pageforge", "generate"]).is_err());
    }
}
