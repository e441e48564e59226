use clap::Parser;

/// Command-line arguments for checkconfig
#[derive(Parser, Debug, Clone)]
#[command(name = "checkconfig")]
#[command(about = "Load, default and validate CI job configuration")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Main configuration file path
    #[arg(long = "config-path", value_name = "PATH", default_value = "./config.yaml")]
    pub config_path: String,

    /// Job configuration file, or directory of job configuration files
    #[arg(long = "job-config-path", value_name = "PATH", default_value = "")]
    pub job_config_path: String,

    /// Print the resolved configuration as YAML after loading it
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}
