use crate::cli::CheckArgs;
use crate::confirm::confirmer;
use crate::error::Result;
use gmxflow::workflows::pipeline;
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    let mut confirm = confirmer(args.yes);
    let validated = pipeline::check(&args.config, args.template.as_deref(), &mut confirm)?;

    let sections: Vec<&str> = validated.section_names().collect();
    info!("Configuration valid, {} section(s)", sections.len());
    println!("Configuration is valid. Sections: {}", sections.join(", "));
    Ok(())
}
