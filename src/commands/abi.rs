use xabi_blockchain::FunctionRegistry;

use super::read_file;
use crate::{cli::AbiCommand, error::CommandError};

pub(super) fn run(command: AbiCommand) -> Result<(), CommandError> {
    match command {
        AbiCommand::Classify { file } => {
            let registry = FunctionRegistry::from_json(&read_file(&file)?)?;
            let classification = registry.classification();

            for (title, group) in [
                ("Read (no input)", &classification.read_no_input),
                ("Read (with input)", &classification.read_with_input),
                ("Write", &classification.write),
            ] {
                println!("{title}: {}", group.len());
                for descriptor in group {
                    println!("  {} [{}]", descriptor.signature(), descriptor.state_mutability);
                }
            }
            Ok(())
        }
    }
}
