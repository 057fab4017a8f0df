use std::path::{Path, PathBuf};

use bytes::Bytes;
use derive_builder::Builder;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use walkdir::{DirEntry, WalkDir};

use crate::client::EMOJI_ADD_PATH;
use crate::context::Context;
use crate::error::{Error, ErrorKind, Result};
use crate::model::MutationResponse;
use crate::names::{derive_names, CandidateNames, NameAffixes};
use crate::progress::{Outcome, Progress, Tally};

/// Errors meaning a built-in emoji owns the name.
pub const NAME_TAKEN_ERRORS: [&str; 2] = ["error_name_taken", "error_name_taken_i18n"];

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct UploadOptions {
    pub directory: PathBuf,
    #[builder(default)]
    pub affixes: NameAffixes,
    #[builder(default = "true")]
    pub progress_bar: bool,
}

impl UploadOptions {
    pub fn builder() -> UploadOptionsBuilder {
        UploadOptionsBuilder::default()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with('.'))
}

/// Everything below `directory` in file name order, hidden files and directories left out.
fn walk(directory: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
}

/// Counts the files below `directory`, directories excluded.
pub fn count_files(directory: &Path) -> Result<usize> {
    let mut total = 0;
    for entry in walk(directory) {
        if !entry?.file_type().is_dir() {
            total += 1;
        }
    }
    Ok(total)
}

fn upload_form(name: &str, token: &str, file_name: &str, data: Bytes) -> Form {
    Form::new()
        .text("mode", "data")
        .text("name", name.to_owned())
        .text("token", token.to_owned())
        .part("image", Part::stream(data).file_name(file_name.to_owned()))
}

fn classify_upload(name: &str, response: MutationResponse, url: String) -> Result<()> {
    if response.ok {
        return Ok(());
    }
    match response.error {
        Some(error) if NAME_TAKEN_ERRORS.contains(&error.as_str()) => {
            Err(Error::NameTaken(name.to_owned()))
        }
        error => Err(Error::RemoteRejected {
            url,
            reason: error.unwrap_or_else(|| "not ok".into()),
        }),
    }
}

impl Context {
    /// Uploads one image under `name`.
    ///
    /// Names in the startup index fail with [`Error::AlreadyExists`] without a request.
    pub async fn post_emoji(&self, name: &str, path: &Path) -> Result<()> {
        if let Some(existing) = self.index.get(name) {
            debug!("`{name}` exists since {}, by {}", existing.created, existing.creator_name);
            return Err(Error::AlreadyExists(name.to_owned()));
        }

        let data = tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|source| Error::Read {
                path: path.to_owned(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|file_name| file_name.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_owned());
        let url = self.client.url(EMOJI_ADD_PATH);

        self.client
            .transport
            .execute(
                &format!("uploading emoji `{name}`"),
                |http| {
                    let form = upload_form(name, &self.token, &file_name, data.clone());
                    http.post(&url).multipart(form)
                },
                |reply| {
                    let response = reply.json::<MutationResponse>()?;
                    classify_upload(name, response, reply.url)
                },
            )
            .await
    }

    /// Tries the primary name, then the taken name once if a built-in emoji owns the first.
    async fn upload_candidate(
        &self,
        path: &Path,
        names: &CandidateNames,
        progress: &Progress,
    ) -> Result<Outcome> {
        let err = match self.post_emoji(&names.name, path).await {
            Ok(()) => return Ok(Outcome::Uploaded),
            Err(err) => err,
        };
        match err.kind() {
            ErrorKind::AlreadyExists => return Ok(Outcome::Skipped),
            ErrorKind::NameTaken => {}
            _ => return Err(err),
        }

        progress.note(&format!(
            "`{}` is taken by a built-in emoji, trying `{}`",
            names.name, names.taken_name
        ));
        match self.post_emoji(&names.taken_name, path).await {
            Ok(()) => Ok(Outcome::Uploaded),
            Err(err) => match err.kind() {
                ErrorKind::AlreadyExists => Ok(Outcome::Skipped),
                ErrorKind::NameTaken => Err(Error::BothNamesExhausted {
                    name: names.name.clone(),
                    taken_name: names.taken_name.clone(),
                }),
                _ => Err(err),
            },
        }
    }

    /// Uploads every file below the options' directory, in file name order.
    ///
    /// The first failure that isn't a skip aborts the run.
    pub async fn post_emojis(&self, options: &UploadOptions) -> Result<Tally> {
        if options.directory.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("emoji directory path is empty"));
        }
        if options.affixes.taken_suffix.is_empty() {
            return Err(Error::InvalidArgument("taken suffix must not be empty"));
        }

        let mut tally = Tally::new(count_files(&options.directory)?);
        info!(
            "uploading {} files from `{}`",
            tally.total,
            options.directory.display()
        );
        let progress = Progress::new(tally.total, options.progress_bar);

        for entry in walk(&options.directory) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let names = derive_names(path, &options.affixes);
            progress.start_file(&entry.file_name().to_string_lossy(), &names.name);

            let outcome = self
                .upload_candidate(path, &names, &progress)
                .await
                .map_err(|source| Error::Upload {
                    path: path.to_owned(),
                    source: Box::new(source),
                })?;
            match outcome {
                Outcome::Skipped => progress.note("skipped existing"),
                Outcome::Uploaded => progress.note("uploaded"),
            }
            tally = tally.record(outcome);
            progress.record(&tally);
        }

        progress.finish();
        debug!("upload run finished: {tally}");
        Ok(tally)
    }
}
