use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::slurm::config::SubmissionConfig;

/// Path to a job script that's submitted to SLURM via sbatch
pub struct JobPath {
    pub path: PathBuf,
}

impl SubmissionConfig {
    /// Render the job script and write it to `wd`, replacing any script from earlier the same day
    pub fn create(&self, wd: &Path) -> Result<JobPath> {
        let path = wd.join(self.script_name());
        info!("Creating job script {}", path.display());

        let content = render_jupyter(self)?;
        write_script(&path, &content)
            .with_context(|| format!("Can't write job script {}", path.display()))?;

        Ok(JobPath { path })
    }
}

impl JobPath {
    /// Run sbatch on the job script
    pub fn submit(&self) -> Option<ExitStatus> {
        self.submit_with(OsStr::new("sbatch"))
    }

    /// Run `program` with the job script path as its only argument
    ///
    /// Unlike a fire-and-forget `sbatch` call, the exit status is logged and returned. A missing
    /// binary or a rejected job still never fails the run.
    pub fn submit_with(&self, program: &OsStr) -> Option<ExitStatus> {
        let mut submit = Command::new(program);
        let cmd = submit.arg(&self.path);
        info!("Running {} process", program.to_string_lossy());
        info!("{:?}", &cmd);

        match cmd.status() {
            Ok(status) if status.success() => {
                info!("Submission exited with {status}");
                Some(status)
            }
            Ok(status) => {
                warn!("Submission exited with {status}, job may not be queued");
                Some(status)
            }
            Err(err) => {
                warn!("Can't run {}: {err}", program.to_string_lossy());
                None
            }
        }
    }
}

/// Rendering context for the jupyter job script
#[derive(Serialize)]
struct JupyterContext {
    partition: String,
    job_name: String,
    out_name: String,
    user: String,
    directory: String,
    shell_name: String,
    conda_env: String,
    r_port: String,
}

impl From<&SubmissionConfig> for JupyterContext {
    fn from(config: &SubmissionConfig) -> Self {
        JupyterContext {
            partition: config.partition.clone(),
            job_name: config.job_name(),
            out_name: config.out_name(),
            user: config.user.clone(),
            directory: config.directory.clone(),
            shell_name: config.shell_name.clone(),
            conda_env: config.conda_env.clone().unwrap_or_default(),
            r_port: config.r_port.clone(),
        }
    }
}

/// Render the SBATCH header and jupyter launch commands using TinyTemplate
///
/// Pure: the same config always renders the same script.
pub fn render_jupyter(config: &SubmissionConfig) -> Result<String> {
    /// included job script template
    static JUPYTER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/jupyter.txt"));
    let mut tt = TinyTemplate::new();
    // shell script, not HTML
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("jupyter", JUPYTER).context("Invalid job script template")?;

    let context = JupyterContext::from(config);
    tt.render("jupyter", &context).context("Can't render job script")
}

fn write_script(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())
}
