use clap::Parser;
use std::path::PathBuf;

/// Recon - domain enumeration and information gathering for a company name
#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target company name (e.g. "acme" expands to acme.com, acme.org, ...)
    pub name: String,

    /// Increase output verbosity
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Enable trace-level logging, including resolver internals
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Output CSV file (default: results/<name>_<timestamp>.csv)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Directory to save screenshots
    #[arg(short = 's', long, default_value = "screenshots")]
    pub screenshot_dir: PathBuf,

    /// Use a SecList wordlist for subdomain enumeration instead of the built-in nine names
    #[arg(long, default_value_t = false)]
    pub seclist: bool,

    /// Wordlist used with --seclist. Not bundled: fetch SecLists'
    /// subdomains-top1million-5000.txt to this path or point here at your own copy
    #[arg(long, default_value = recon::config::DEFAULT_WORDLIST)]
    pub wordlist: PathBuf,

    /// Use all TLDs from the ICANN list instead of the predefined ten
    #[arg(long, default_value_t = false)]
    pub icann: bool,

    /// TLD list used with --icann. Not bundled: save
    /// https://data.iana.org/TLD/tlds-alpha-by-domain.txt to this path or point here at your own copy
    #[arg(long, default_value = recon::config::DEFAULT_TLD_LIST)]
    pub tld_list: PathBuf,

    /// Maximum concurrent port scans, WHOIS lookups and screenshots
    #[arg(short = 't', long, default_value_t = recon::config::DEFAULT_WORKERS)]
    pub threads: usize,

    /// Maximum concurrent DNS/HTTP probes
    #[arg(long, default_value_t = recon::config::DEFAULT_HTTP_CONCURRENCY)]
    pub http_concurrency: usize,

    /// Also write the host records as JSON lines
    #[arg(long, value_name = "FILE")]
    pub jsonl: Option<PathBuf>,

    /// JSON file with probe settings (timeouts, ports, tool binaries)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not check for nmap, whois and gowitness before starting
    #[arg(long, default_value_t = false)]
    pub skip_deps_check: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
