use std::path::PathBuf;

use structopt::StructOpt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirPathParseError {
    #[error("couldn't fetch metadata: {0}")]
    NoMetadata(#[from] std::io::Error),
    #[error("exists, but is not a directory")]
    InvalidType,
}

#[derive(Error, Debug)]
pub enum FilePathParseError {
    #[error("couldn't fetch metadata: {0}")]
    NoMetadata(#[from] std::io::Error),
    #[error("doesn't correspond to a file")]
    InvalidType,
}

pub fn valid_dir_path<P>(src: P) -> Result<PathBuf, DirPathParseError>
where
    P: AsRef<str>,
{
    let path = PathBuf::from(src.as_ref());
    if !path.metadata()?.is_dir() {
        Err(DirPathParseError::InvalidType)
    } else {
        Ok(path)
    }
}

fn valid_file_path<P>(src: P) -> Result<PathBuf, FilePathParseError>
where
    P: AsRef<str>,
{
    let path = PathBuf::from(src.as_ref());
    if !path.metadata()?.is_file() {
        Err(FilePathParseError::InvalidType)
    } else {
        Ok(path)
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "emojoid", about = "Upload a directory of images as custom Slack emoji.")]
pub struct Opt {
    /// JSON configuration file
    #[structopt(long = "config", parse(try_from_str = valid_file_path))]
    pub config_file: Option<PathBuf>,

    /// Workspace name, the `acme` of `acme.slack.com`
    #[structopt(long)]
    pub team: Option<String>,

    /// Host the workspace lives on
    #[structopt(long, default_value = "slack.com")]
    pub host: String,

    /// Value of the `Cookie` header of a logged in browser session
    #[structopt(long, env = "EMOJOID_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Seconds after which a failing request is no longer retried
    #[structopt(long, default_value = "900")]
    pub give_up_after: u64,

    /// Log more, can be repeated
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,

    /// Only log warnings and errors
    #[structopt(short, long)]
    pub quiet: bool,

    #[structopt(subcommand)]
    pub cmd: Option<Command>,
}

impl Opt {
    /// Uploading is the default.
    pub fn command(&self) -> Command {
        self.cmd
            .clone()
            .unwrap_or_else(|| Command::Upload(UploadOpt::default()))
    }
}

#[derive(Debug, Clone, StructOpt)]
pub enum Command {
    /// Upload every file below a directory as an emoji
    Upload(UploadOpt),
    /// Print the workspace's custom emoji
    List {
        /// Print JSON instead of `:name:` lines
        #[structopt(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Default, StructOpt)]
pub struct UploadOpt {
    /// Directory holding the images
    #[structopt(long = "dir", parse(try_from_str = valid_dir_path))]
    pub directory: Option<PathBuf>,

    /// Prepended to every emoji name
    #[structopt(long)]
    pub prefix: Option<String>,

    /// Appended to every emoji name
    #[structopt(long)]
    pub suffix: Option<String>,

    /// Prepended to names already owned by a built-in emoji
    #[structopt(long)]
    pub taken_prefix: Option<String>,

    /// Appended to names already owned by a built-in emoji
    #[structopt(long)]
    pub taken_suffix: Option<String>,

    /// Don't ask before uploading
    #[structopt(short, long)]
    pub yes: bool,

    /// Don't draw a progress bar
    #[structopt(long)]
    pub no_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_is_the_default_command() {
        let opt = Opt::from_iter(["emojoid", "--team", "acme"]);
        assert!(matches!(opt.command(), Command::Upload(_)));
        assert_eq!(opt.host, "slack.com");
        assert_eq!(opt.give_up_after, 900);
    }

    #[test]
    fn parses_upload_flags() {
        let dir = std::env::temp_dir();
        let opt = Opt::from_iter([
            "emojoid",
            "-vv",
            "upload",
            "--dir",
            dir.to_str().unwrap(),
            "--prefix",
            "team-",
            "--taken-suffix",
            "_alt",
            "--yes",
        ]);
        assert_eq!(opt.verbose, 2);
        let Command::Upload(upload) = opt.command() else {
            panic!("expected upload");
        };
        assert_eq!(upload.directory, Some(dir));
        assert_eq!(upload.prefix.as_deref(), Some("team-"));
        assert_eq!(upload.taken_suffix.as_deref(), Some("_alt"));
        assert!(upload.yes);
    }

    #[test]
    fn parses_list() {
        let opt = Opt::from_iter(["emojoid", "list", "--json"]);
        assert!(matches!(opt.command(), Command::List { json: true }));
    }

    #[test]
    fn rejects_files_as_directories() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = valid_dir_path(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, DirPathParseError::InvalidType));
    }
}
