//! meshforge command-line binary

fn main() -> anyhow::Result<()> {
    meshforge::cli::run_cli()
}
