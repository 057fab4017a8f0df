mod client;
mod config;
mod context;
mod error;
mod listing;
mod logging;
mod model;
mod names;
mod opt;
mod progress;
mod token;
mod transport;
mod upload;

use anyhow::Result;
use config::Config;
use context::Context;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use opt::{Command, Opt, UploadOpt};

use log::{error, info, warn};
use structopt::StructOpt;

fn exit(code: i32, err: anyhow::Error) -> ! {
    error!("{err:#}");
    std::process::exit(code);
}

fn confirm_blocking(prompt: String) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

async fn confirm(prompt: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || confirm_blocking(prompt)).await?
}

fn print_index(ctx: &Context, json: bool) -> Result<()> {
    if ctx.index.is_empty() && !json {
        info!("no custom emoji yet");
        return Ok(());
    }
    let emojis = ctx.index.sorted();
    if json {
        println!("{}", serde_json::to_string_pretty(&emojis)?);
        return Ok(());
    }
    for emoji in emojis {
        if emoji.is_usable() {
            println!(":{}:", emoji.name);
        } else {
            println!(":{}: (bad)", emoji.name);
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();
    let opt = Opt::from_args();

    if let Err(err) = logging::init(logging::level(opt.verbose, opt.quiet)) {
        eprintln!("couldn't set up logging: {err:#}");
        std::process::exit(1);
    }

    let command = opt.command();
    let upload = match &command {
        Command::Upload(upload) => upload.clone(),
        Command::List { .. } => UploadOpt::default(),
    };
    let config = Config::load(&opt, &upload).unwrap_or_else(|err| exit(1, err));

    // Checked before any request so a bad directory doesn't cost a session.
    let options = match command {
        Command::Upload(_) => Some(
            config
                .upload_options(!upload.no_progress)
                .unwrap_or_else(|err| exit(1, err)),
        ),
        Command::List { .. } => None,
    };

    let client = config.client().unwrap_or_else(|err| exit(1, err));
    let ctx = Context::open(client)
        .await
        .unwrap_or_else(|err| exit(2, err.context("couldn't open a session")));
    info!("`{}` holds {} custom emoji", config.team, ctx.index.len());

    let Some(options) = options else {
        if let Command::List { json } = command {
            print_index(&ctx, json).unwrap_or_else(|err| exit(1, err));
        }
        return;
    };

    if !upload.yes {
        let prompt = format!(
            "Upload everything below `{}` to `{}`?",
            options.directory.display(),
            ctx.client.base_url()
        );
        match confirm(prompt).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("nothing uploaded");
                return;
            }
            Err(err) => exit(1, err),
        }
    }

    match ctx.post_emojis(&options).await {
        Ok(tally) => info!("done, {tally}"),
        Err(err) => exit(3, err.into()),
    }
}
