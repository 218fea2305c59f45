use std::env;
use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::slurm::config::SubmissionConfig;

mod slurm;

/// Submit a SLURM job that runs a remote Jupyter Lab session
///
/// The job script is written to the current directory as slurm_jupyter_<yy-mm-dd> and submitted
/// with sbatch. Once the job is running, tunnel to the compute node with `ssh -L` and open the
/// forwarded port in a local browser.
#[derive(Parser, Debug)]
#[command(name = "remote-jupyter", version, infer_long_args = true)]
pub struct Args {
    /// Which partition to run the job on
    #[arg(long, default_value = "p_km1243_1")]
    pub partition: String,
    /// Directory in which jupyter lab should launch
    #[arg(long, default_value = "/projects/f_km1243_1/")]
    pub directory: String,
    /// Shell init file where the conda environment path is defined
    #[arg(long = "shell_name", default_value = "~/.bashrc")]
    pub shell_name: String,
    /// Name of the conda environment jupyter lab should run in
    #[arg(long = "conda_env")]
    pub conda_env: Option<String>,
    /// Remote port jupyter lab binds to
    #[arg(long = "r_port", default_value = "8888")]
    pub r_port: String,
}

/// Long flags that may be spelled with a single dash, e.g. `-conda_env=astroconda` or `-conda=astroconda`
const SINGLE_DASH_FLAGS: [&str; 5] = ["partition", "directory", "shell_name", "conda_env", "r_port"];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("terve! starting up :)");

    let args = Args::parse_from(normalise_args(env::args_os()));
    let config = SubmissionConfig::from_args(args);
    info!("Submission config: {:?}", config);

    let cwd = env::current_dir().context("Can't read current working directory")?;
    let job = config.create(&cwd)?;
    job.submit();
    config.log_next_steps();

    Ok(())
}

/// Rewrite `-flag` and unique prefixes like `-conda` into `--conda_env` so clap can parse them
fn normalise_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str().and_then(expand_single_dash_flag) {
            Some(expanded) => OsString::from(expanded),
            None => arg,
        })
        .collect()
}

fn expand_single_dash_flag(arg: &str) -> Option<String> {
    let rest = arg.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
    let (name, value) = match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };
    if name.is_empty() {
        return None;
    }

    let mut matches = SINGLE_DASH_FLAGS.iter().filter(|flag| flag.starts_with(name));
    let flag = match (matches.next(), matches.next()) {
        (Some(flag), None) => flag,
        _ => return None,
    };
    Some(match value {
        Some(value) => format!("--{flag}={value}"),
        None => format!("--{flag}"),
    })
}
