use std::env;

use chrono::Local;
use log::{info, warn};

use crate::Args;

/// Prefix shared by the job name, the output files, and the script file name
const JOB_PREFIX: &str = "jupyter";

/// Everything needed to render one job script
///
/// Built once per invocation and never changed afterwards. No field is validated: a missing conda
/// environment renders as an empty `conda activate` argument and only fails inside the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionConfig {
    pub partition: String,
    pub directory: String,
    pub shell_name: String,
    pub conda_env: Option<String>,
    pub r_port: String,
    /// Login name of the invoking user, taken from $USER
    pub user: String,
    /// Submission date, formatted as yy-mm-dd
    pub date: String,
}

impl SubmissionConfig {
    /// Resolve a config from parsed options, $USER, and today's local date
    pub fn from_args(args: Args) -> SubmissionConfig {
        let user = env::var("USER").unwrap_or_else(|_| {
            warn!("$USER isn't set, job name and mail recipient will be incomplete");
            String::new()
        });
        let date = Local::now().format("%y-%m-%d").to_string();
        SubmissionConfig::new(args, user, date)
    }

    pub fn new(args: Args, user: String, date: String) -> SubmissionConfig {
        if args.conda_env.is_none() {
            warn!("-conda_env not set, the job won't be able to activate an environment");
        }

        SubmissionConfig {
            partition: args.partition,
            directory: args.directory,
            shell_name: args.shell_name,
            conda_env: args.conda_env,
            r_port: args.r_port,
            user,
            date,
        }
    }

    /// SLURM job name, e.g. jupyter_jdoe
    pub fn job_name(&self) -> String {
        format!("{JOB_PREFIX}_{}", self.user)
    }

    /// Base name of the job's .out and .err files, e.g. jupyter_24-01-01
    pub fn out_name(&self) -> String {
        format!("{JOB_PREFIX}_{}", self.date)
    }

    /// Name of the generated job script, e.g. slurm_jupyter_24-01-01
    pub fn script_name(&self) -> String {
        format!("slurm_{}", self.out_name())
    }

    /// Print the manual steps needed to reach the notebook server once the job starts
    pub fn log_next_steps(&self) {
        info!("Find the node running your session with: squeue -u {}", self.user);
        info!(
            "Then tunnel from your local machine: ssh -L <local port>:<node>:{} {}@<login host>",
            self.r_port, self.user
        );
        info!("Browse to localhost:<local port>; the server token is printed in {}.err", self.out_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            partition: "main".to_string(),
            directory: "/tmp/x".to_string(),
            shell_name: "~/.bashrc".to_string(),
            conda_env: Some("astroconda".to_string()),
            r_port: "9999".to_string(),
        }
    }

    #[test]
    fn derived_names() {
        let config = SubmissionConfig::new(args(), "jdoe".to_string(), "24-01-01".to_string());
        assert_eq!(config.job_name(), "jupyter_jdoe");
        assert_eq!(config.out_name(), "jupyter_24-01-01");
        assert_eq!(config.script_name(), "slurm_jupyter_24-01-01");
    }

    #[test]
    fn script_name_starts_with_prefix_and_date() {
        let config = SubmissionConfig::from_args(args());
        assert!(config.script_name().starts_with("slurm_jupyter_"));
        assert_eq!(config.script_name(), format!("slurm_jupyter_{}", config.date));
    }

    #[test]
    fn date_is_two_digit_year_month_day() {
        let config = SubmissionConfig::from_args(args());
        let parts: Vec<&str> = config.date.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn options_are_carried_over() {
        let mut a = args();
        a.conda_env = None;
        let config = SubmissionConfig::new(a, "jdoe".to_string(), "24-01-01".to_string());
        assert_eq!(config.partition, "main");
        assert_eq!(config.directory, "/tmp/x");
        assert_eq!(config.conda_env, None);
        assert_eq!(config.r_port, "9999");
    }
}
