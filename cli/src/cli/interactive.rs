use std::path::PathBuf;

use app::{EngineError, JobController, JobError, LifecycleState, SourceRef};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use vidtrim_core::OutputKind;

use super::{
    argparse::{AppConfig, ClipOpts},
    helpers::error_chain,
};

const HELP: &str = "\
commands:
  open <path>    select a video
  close          dismiss the video and reset the form
  gif | mp3      choose what to export
  name [<name>]  name of the saved file (blank for the default)
  start <secs>   start of the clip
  time <secs>    length of the clip
  status         show the current selection and form
  convert        convert and save
  quit";

#[derive(Parser, Debug)]
pub struct InteractiveOpts {
    /// A video to select right away
    pub input: Option<PathBuf>,

    #[clap(flatten)]
    pub clip: ClipOpts,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Open(PathBuf),
    Close,
    Kind(OutputKind),
    Name(String),
    Start(String),
    Time(String),
    Status,
    Convert,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let needs_arg = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("`{}` needs {}", word, what))
        } else {
            Ok(rest.to_owned())
        }
    };
    let cmd = match word.to_ascii_lowercase().as_str() {
        "open" => Command::Open(PathBuf::from(needs_arg("a path")?)),
        "close" => Command::Close,
        "gif" | "mp3" => Command::Kind(word.parse().map_err(|e| format!("{}", e))?),
        "name" => Command::Name(rest.to_owned()),
        "start" => Command::Start(needs_arg("a number of seconds")?),
        "time" => Command::Time(needs_arg("a number of seconds")?),
        "status" => Command::Status,
        "convert" => Command::Convert,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(format!("unknown command `{}`, try `help`", word)),
    };
    Ok(Some(cmd))
}

fn print_status(controller: &JobController) {
    let form = controller.form();
    let engine = if controller.engine_ready() {
        "ready"
    } else if controller.engine_failure().is_some() {
        "failed"
    } else {
        "loading"
    };
    println!(
        "video: {}",
        controller
            .source_name()
            .unwrap_or_else(|| "(none)".to_owned())
    );
    println!(
        "export: {}  name: {:?}  start: {}  time: {}",
        controller.kind(),
        form.name,
        form.start,
        form.time
    );
    println!("state: {:?}  ffmpeg: {}", controller.lifecycle(), engine);
    if let Some(e) = controller.engine_failure() {
        println!("ffmpeg error: {}", e);
    }
    if controller.lifecycle() == LifecycleState::Error {
        if let Some(e) = controller.last_error() {
            println!("last error: {}", e);
        }
    }
    let avail = controller.submit_availability();
    println!("[{}]", avail.label(controller.kind()));
}

async fn open(controller: &JobController, path: PathBuf) {
    match SourceRef::pick(&path).await {
        Ok(src) => match controller.select(src) {
            Ok(()) => println!("selected {}", path.display()),
            Err(e) => println!("{}", error_chain(e)),
        },
        Err(e) => println!("{}", error_chain(e)),
    }
}

fn report(res: Result<(), JobError>) {
    if let Err(e) = res {
        println!("{}", error_chain(e));
    }
}

async fn apply(controller: &JobController, cmd: Command) {
    match cmd {
        Command::Open(path) => open(controller, path).await,
        Command::Close => report(controller.clear()),
        Command::Kind(kind) => report(controller.set_kind(kind)),
        Command::Name(name) => report(controller.update_form(|f| f.name = name)),
        Command::Start(start) => report(controller.update_form(|f| f.start = start)),
        Command::Time(time) => report(controller.update_form(|f| f.time = time)),
        Command::Status => print_status(controller),
        Command::Convert => {
            let avail = controller.submit_availability();
            if avail.is_available() {
                println!("{}", avail.label(controller.kind()));
            }
            match controller.submit().await {
                Ok(saved) => println!("saved {}", saved.location.display()),
                Err(e) => println!("{}", error_chain(e)),
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn engine_failed(controller: &JobController, e: EngineError) {
    controller.engine_load_failed(&e);
    println!("{}", error_chain(e));
}

impl InteractiveOpts {
    pub(crate) async fn run(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        let app = cfg.build_app(&self.clip)?;
        let controller = app.controller()?;
        let mut loader = app.start_engine();
        let mut loading = true;

        self.clip.apply(&controller)?;
        if let Some(input) = &self.input {
            open(&controller, input.clone()).await;
        }
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                res = &mut loader, if loading => {
                    loading = false;
                    match res {
                        Ok(Ok(())) => println!("ffmpeg is ready"),
                        Ok(Err(e)) => engine_failed(&controller, e),
                        Err(e) => {
                            log::error!("engine loader task failed: {}", e);
                            controller.engine_load_failed(e);
                        }
                    }
                }
                line = lines.next_line() => {
                    let line = match line? {
                        Some(line) => line,
                        None => break,
                    };
                    match parse_command(&line) {
                        Ok(None) => {}
                        Ok(Some(Command::Quit)) => break,
                        Ok(Some(cmd)) => apply(&controller, cmd).await,
                        Err(msg) => println!("{}", msg),
                    }
                }
            }
        }
        Ok(())
    }
}
