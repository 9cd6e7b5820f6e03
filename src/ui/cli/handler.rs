// Wed Jan 15 2026 - Alex

use super::args::{Args, Command, ReadArgs, ReadKind};
use crate::config::EngineConfig;
use crate::memory::{MemoryCell, MemoryEngine, MemoryKey};
use crate::target::LocalProcess;
use crate::utils::{hex_string_spaced, LoggingUtils};
use anyhow::{anyhow, Context};
use colored::Colorize;
use std::sync::Arc;

pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, args: Args) -> anyhow::Result<()> {
        if args.no_color {
            colored::control::set_override(false);
        }
        LoggingUtils::init(LoggingUtils::level_from_str(&args.log_level));
        args.validate().map_err(|e| anyhow!(e))?;

        let engine = self.attach(&args)?;
        match args.command {
            Command::Maps => self.handle_maps(&engine),
            Command::Read(read) => self.handle_read(&engine, read),
            Command::Entry => self.handle_entry(&engine),
        }
    }

    fn attach(&self, args: &Args) -> anyhow::Result<MemoryEngine> {
        let config = match &args.config {
            Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => EngineConfig::default(),
        };

        let process = match args.pid {
            Some(pid) => LocalProcess::attach(pid),
            None => LocalProcess::current(),
        }
        .context("attaching to process")?;
        log::info!("attached to pid {}", process.pid());

        Ok(MemoryEngine::with_config(Arc::new(process), config)?)
    }

    fn handle_maps(&self, engine: &MemoryEngine) -> anyhow::Result<()> {
        print!("{}", engine);
        Ok(())
    }

    fn handle_read(&self, engine: &MemoryEngine, args: ReadArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow!(e))?;

        let resolved = engine
            .resolve(MemoryKey::Symbol(args.key.clone()))?
            .ok_or_else(|| anyhow!("Could not resolve '{}'", args.key))?;
        let cell = match args.kind {
            ReadKind::Bytes => engine
                .get(resolved.address.as_u64()..resolved.address.as_u64().saturating_add(args.len))?
                .ok_or_else(|| anyhow!("Invalid byte range at {}", resolved.address))?,
            _ => engine.cell_at(resolved.address),
        };

        println!("{} {}", format!("{}:", cell.address()).green(), Self::render(&cell, args.kind)?);
        Ok(())
    }

    fn render(cell: &MemoryCell<'_>, kind: ReadKind) -> anyhow::Result<String> {
        Ok(match kind {
            ReadKind::Int8 => cell.int8()?.to_string(),
            ReadKind::Uint8 => cell.uint8()?.to_string(),
            ReadKind::Int16 => cell.int16()?.to_string(),
            ReadKind::Uint16 => cell.uint16()?.to_string(),
            ReadKind::Int32 => cell.int32()?.to_string(),
            ReadKind::Uint32 => cell.uint32()?.to_string(),
            ReadKind::Int64 => cell.int64()?.to_string(),
            ReadKind::Uint64 => cell.uint64()?.to_string(),
            ReadKind::Pointer => cell.pointer()?.to_string(),
            ReadKind::Float => cell.float()?.to_string(),
            ReadKind::Double => cell.double()?.to_string(),
            ReadKind::Bytes => hex_string_spaced(&cell.bytes()?),
            ReadKind::Utf8 => format!("{:?}", cell.string_utf8()?),
            ReadKind::Utf16 => format!("{:?}", cell.string_utf16()?),
        })
    }

    fn handle_entry(&self, engine: &MemoryEngine) -> anyhow::Result<()> {
        println!("{}", engine.entrypoint()?.to_string().green());
        Ok(())
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Protection;
    use crate::target::SimulatedProcess;

    #[test]
    fn test_maps_prints_engine() {
        let sim = SimulatedProcess::builder()
            .map(0x1000, 0x1000, Protection::READ | Protection::EXECUTE, Some(("/tmp/bins/app", 0)))
            .build();
        let engine = MemoryEngine::new(Arc::new(sim));
        assert!(CommandHandler::new().handle_maps(&engine).is_ok());
        assert!(engine.to_string().starts_with("<MemoryEngine Local ranges=1 files=1 breakpoints=0>"));
    }
}
