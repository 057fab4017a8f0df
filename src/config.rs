use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use lazy_regex::regex_is_match;
use serde::Deserialize;
use simple_error::simple_error;

use crate::client::Client;
use crate::names::NameAffixes;
use crate::opt::{Opt, UploadOpt};
use crate::transport::RetryPolicy;
use crate::upload::UploadOptions;

/// The JSON configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub slack_team_name: Option<String>,
    pub slack_emoji_cookie: Option<String>,
    pub slack_emoji_directory: Option<PathBuf>,
    pub slack_emoji_alias_prefix: Option<String>,
    pub slack_emoji_alias_suffix: Option<String>,
    pub slack_emoji_alias_taken_prefix: Option<String>,
    pub slack_emoji_alias_taken_suffix: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<FileConfig> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {}
            Some(ext) => {
                return Err(simple_error!("unsupported configuration file extension `{}`", ext).into());
            }
            None => return Err(simple_error!("configuration file path has no extension").into()),
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("couldn't read `{}`", path.display()))?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<FileConfig> {
        if data.trim().is_empty() {
            return Err(simple_error!("configuration data is empty").into());
        }
        Ok(serde_json::from_str(data)?)
    }
}

/// Command line and file settings merged, the command line winning.
#[derive(Debug, Clone)]
pub struct Config {
    pub team: String,
    pub host: String,
    pub cookie: String,
    pub retry: RetryPolicy,
    pub directory: Option<PathBuf>,
    pub affixes: NameAffixes,
}

impl Config {
    pub fn load(opt: &Opt, upload: &UploadOpt) -> Result<Config> {
        let file = match &opt.config_file {
            Some(path) => FileConfig::from_file(path)
                .with_context(|| format!("loading `{}` failed", path.display()))?,
            None => FileConfig::default(),
        };
        Self::merge(opt, upload, file)
    }

    pub fn merge(opt: &Opt, upload: &UploadOpt, file: FileConfig) -> Result<Config> {
        let team = opt
            .team
            .clone()
            .or(file.slack_team_name)
            .ok_or_else(|| simple_error!("no workspace given, use `--team`"))?;
        if !regex_is_match!(r"^[A-Za-z0-9][A-Za-z0-9-]*$", &team) {
            return Err(simple_error!("`{}` is not a valid workspace name", team).into());
        }
        let cookie = opt
            .cookie
            .clone()
            .or(file.slack_emoji_cookie)
            .filter(|cookie| !cookie.trim().is_empty())
            .ok_or_else(|| simple_error!("no session cookie given, use `--cookie`"))?;

        let pick = |cli: &Option<String>, file: Option<String>| {
            cli.clone().or(file).unwrap_or_default()
        };
        let affixes = NameAffixes {
            prefix: pick(&upload.prefix, file.slack_emoji_alias_prefix),
            suffix: pick(&upload.suffix, file.slack_emoji_alias_suffix),
            taken_prefix: pick(&upload.taken_prefix, file.slack_emoji_alias_taken_prefix),
            taken_suffix: pick(&upload.taken_suffix, file.slack_emoji_alias_taken_suffix),
        };

        let retry = RetryPolicy::builder()
            .max_elapsed(Duration::from_secs(opt.give_up_after))
            .build()?;

        Ok(Config {
            team,
            host: opt.host.clone(),
            cookie,
            retry,
            directory: upload.directory.clone().or(file.slack_emoji_directory),
            affixes,
        })
    }

    pub fn client(&self) -> Result<Client> {
        Ok(Client::new(&self.team, &self.host, &self.cookie, self.retry.clone())?)
    }

    pub fn upload_options(&self, progress_bar: bool) -> Result<UploadOptions> {
        let directory = self
            .directory
            .clone()
            .ok_or_else(|| simple_error!("no emoji directory given, use `--dir`"))?;
        if !directory.is_dir() {
            return Err(simple_error!("`{}` is not a directory", directory.display()).into());
        }
        if self.affixes.taken_suffix.is_empty() {
            return Err(
                simple_error!("the taken suffix must not be empty, use `--taken-suffix`").into(),
            );
        }
        Ok(UploadOptions::builder()
            .directory(directory)
            .affixes(self.affixes.clone())
            .progress_bar(progress_bar)
            .build()?)
    }
}
