use std::borrow::Cow;
use std::fs;

use crate::backend::machine::{self, Machine, MachineDescription};
use crate::backend::register_allocation::{allocate, verify, AllocSettings, Program, ProgramDescription};
use crate::error::Error;
use crate::options::Options;
use crate::{error, warning};

/// Allocates every input file and writes the combined listing.
/// Errors are reported on stderr as they occur.
pub fn drive(options: Options) -> Result<(), ()> {
    log::info!("driver started");
    let machine = match load_machine(&options) {
        Ok(machine) => machine,
        Err(message) => {
            let context = options.machine.as_deref().unwrap_or(&options.target);
            error!(context, "{}", message);
            return Err(());
        }
    };
    let settings = AllocSettings::from(&options.allocation_settings);

    let mut listing = String::new();
    let mut failed = false;
    for filename in &options.input {
        match allocate_file(&machine, filename, &settings, &options) {
            Ok(text) => listing.push_str(&text),
            Err(message) => {
                error!(filename, "{}", message);
                failed = true;
            }
        }
    }

    match &options.output {
        Some(output) => {
            if let Err(message) = fs::write(output, &listing) {
                error!(output, "{}", message);
                return Err(());
            }
        }
        None => print!("{}", listing),
    }
    if failed {
        Err(())
    } else {
        Ok(())
    }
}

fn read(path: &str) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_string(),
        source,
    })
}

/// The machine named by `--machine`, or else the built-in `--target`, which is
/// shared rather than rebuilt.
pub fn load_machine(options: &Options) -> Result<Cow<'static, Machine>, Error> {
    match &options.machine {
        Some(path) => {
            let description = MachineDescription::from_json(&read(path)?).map_err(|source| Error::Json {
                path: path.clone(),
                source,
            })?;
            Ok(Cow::Owned(Machine::from_description(&description)?))
        }
        None => {
            let machine = machine::builtin_machine(&options.target)
                .ok_or_else(|| Error::UnknownTarget(options.target.clone()))??;
            Ok(Cow::Borrowed(machine))
        }
    }
}

/// Allocates one program description and renders its listing.
pub fn allocate_file(
    machine: &Machine,
    filename: &str,
    settings: &AllocSettings,
    options: &Options,
) -> Result<String, Error> {
    log::info!("allocating {}", filename);
    let description = ProgramDescription::from_json(&read(filename)?).map_err(|source| Error::Json {
        path: filename.to_string(),
        source,
    })?;
    let mut program = Program::from_description(&description, machine)?;
    let allocation = allocate(machine, &mut program, settings)?;
    if options.verify {
        verify(machine, &program, &allocation).map_err(Error::Verification)?;
    }

    let broken = program.broken_linkages().count();
    if broken > 0 {
        eprintln!(
            "{}",
            warning!(filename, "{} linkages broken after {} attempts", broken, allocation.attempt_count())
        );
    }

    let mut text = format!("; {}\n", filename);
    if options.stats {
        text.push_str(&allocation.render_stats());
    }
    text.push_str(&allocation.render(machine, &program));
    Ok(text)
}
