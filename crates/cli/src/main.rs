mod glob;
mod prompt;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, Result},
    clap::Parser,
    colored::Colorize,
    deadlist_config::DeadlistConfig,
    deadlist_linter::{Linter, lint_file},
    deadlist_liveness::{DeadDomainResolver, HostCache, UrlFilterClient, build_http_client},
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
};

use crate::prompt::{Mode, Prompter};

/// Find filter-list rules that reference dead domains and fix them.
///
/// Every file is linted, the proposed edits are confirmed one by one, and the
/// file is rewritten only after a final confirmation.
#[derive(Parser, Debug)]
#[command(name = "deadlist", version)]
struct Args {
    /// Files or glob patterns to lint.
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,

    /// Glob pattern of files to lint [default: **/*.txt].
    #[arg(short, long)]
    input: Option<String>,

    /// Double-check dead domains with a DNS lookup.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    dnscheck: Option<bool>,

    /// Comment out dead rules instead of removing them.
    #[arg(long)]
    commentout: bool,

    /// Apply every change without asking.
    #[arg(short, long, conflicts_with = "show")]
    auto: bool,

    /// Only show the changes, never write.
    #[arg(short, long)]
    show: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file [default: ~/.config/deadlist/deadlist.toml].
    #[arg(long, env = "DEADLIST_CONFIG")]
    config: Option<PathBuf>,

    /// Liveness service endpoint.
    #[arg(long, env = "DEADLIST_ENDPOINT")]
    endpoint: Option<String>,
}

impl Args {
    fn patterns(&self) -> Vec<String> {
        let mut patterns = self.inputs.clone();
        patterns.extend(self.input.clone());
        if patterns.is_empty() {
            patterns.push(glob::DEFAULT_PATTERN.to_string());
        }
        patterns
    }

    fn mode(&self) -> Mode {
        if self.show {
            Mode::Show
        } else if self.auto {
            Mode::Auto
        } else {
            Mode::Ask
        }
    }

    /// Command-line flags win over the configuration file.
    fn apply(&self, config: &mut DeadlistConfig) {
        if let Some(dns_check) = self.dnscheck {
            config.dns_check = dns_check;
        }
        if self.commentout {
            config.comment_out = true;
        }
        if let Some(ref endpoint) = self.endpoint {
            config.endpoint = endpoint.clone();
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,deadlist=debug,deadlist_rules=debug,deadlist_liveness=debug,deadlist_linter=debug,deadlist_config=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config =
        DeadlistConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let files = glob::expand_all(&args.patterns())?;
    if files.is_empty() {
        warn!(patterns = ?args.patterns(), "no files to lint");
        return Ok(());
    }
    info!(files = files.len(), dns_check = config.dns_check, "starting");

    let hosts = Arc::new(HostCache::system());
    let http = build_http_client(Arc::clone(&hosts), &config.user_agent)
        .context("failed to build HTTP client")?;
    let api = UrlFilterClient::new(http, &config.endpoint)
        .context("invalid liveness endpoint")?
        .with_max_attempts(config.max_attempts);
    let resolver = DeadDomainResolver::new(Arc::new(api), hosts).with_chunk_size(config.chunk_size);
    let linter = Linter::new(Arc::new(resolver), config.lint_options());

    let mut prompter = Prompter::stdio(args.mode());
    let mut issues = 0;
    let mut written = 0;
    for file in &files {
        let report = lint_file(&linter, file, &mut prompter)
            .await
            .with_context(|| format!("failed to lint {}", file.display()))?;
        issues += report.results.len();
        if report.written {
            written += 1;
            println!("{} {}", "✓".green(), file.display());
        }
    }

    info!(files = files.len(), issues, written, "done");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use {super::*, clap::CommandFactory, rstest::rstest};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("deadlist").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_to_every_txt_file() {
        let args = parse(&[]);
        assert_eq!(args.patterns(), vec!["**/*.txt"]);
        assert_eq!(args.mode(), Mode::Ask);
    }

    #[test]
    fn positional_inputs_and_glob_combine() {
        let args = parse(&["a.txt", "b.txt", "-i", "lists/*.txt"]);
        assert_eq!(args.patterns(), vec!["a.txt", "b.txt", "lists/*.txt"]);
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&["--dnscheck", "false", "--commentout", "--endpoint", "http://127.0.0.1:1/check"]);
        let mut config = DeadlistConfig::default();
        args.apply(&mut config);
        assert!(!config.dns_check);
        assert!(config.comment_out);
        assert_eq!(config.endpoint, "http://127.0.0.1:1/check");
    }

    #[rstest]
    #[case(&["--dnscheck"], Some(true))]
    #[case(&["--dnscheck", "true"], Some(true))]
    #[case(&["--dnscheck=false"], Some(false))]
    #[case(&[], None)]
    fn dnscheck_flag_forms(#[case] argv: &[&str], #[case] expected: Option<bool>) {
        assert_eq!(parse(argv).dnscheck, expected);
    }

    #[test]
    fn bare_dnscheck_before_inputs() {
        let args = parse(&["--dnscheck", "--commentout", "a.txt"]);
        assert_eq!(args.dnscheck, Some(true));
        assert_eq!(args.patterns(), vec!["a.txt"]);
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = DeadlistConfig {
            dns_check: false,
            comment_out: true,
            ..DeadlistConfig::default()
        };
        parse(&[]).apply(&mut config);
        assert!(!config.dns_check);
        assert!(config.comment_out);
    }

    #[test]
    fn show_and_auto_conflict() {
        assert!(Args::try_parse_from(["deadlist", "--show", "--auto"]).is_err());
        assert_eq!(parse(&["-s"]).mode(), Mode::Show);
        assert_eq!(parse(&["-a"]).mode(), Mode::Auto);
    }
}
