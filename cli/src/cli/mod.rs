pub mod argparse;
mod convert;
mod helpers;
mod interactive;

impl argparse::CliOpts {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        match &self.subcmd {
            argparse::SubCommand::Convert(opts) => opts.run(&self.cfg).await,
            argparse::SubCommand::Interactive(opts) => opts.run(&self.cfg).await,
            argparse::SubCommand::ShowConfig => helpers::show_config(&self.cfg),
        }
    }
}
