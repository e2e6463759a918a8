//! Runs a guest ELF image to completion on the RV32IM + Zicond core,
//! optionally replaying a precomputed instruction-level-parallelism
//! schedule, and prints serial output as the guest emits it.

use std::io::Write;

use clap::Parser;
use clap_num::maybe_hex;
use rv32_emu::Device;

/// Run a bare-metal RV32IM + Zicond guest image.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the guest ELF image
    input: String,

    /// Path to an optional "ILP\0"-tagged instruction schedule file
    #[arg(long)]
    ilp: Option<String>,

    /// ROM region size in bytes
    #[arg(long, value_parser=maybe_hex::<u32>, default_value = "0x4000")]
    rom_size: u32,

    /// ROM region base address
    #[arg(long, value_parser=maybe_hex::<u32>, default_value = "0x08000000")]
    rom_origin: u32,

    /// RAM region size in bytes
    #[arg(long, value_parser=maybe_hex::<u32>, default_value = "0x1000")]
    ram_size: u32,

    /// RAM region base address
    #[arg(long, value_parser=maybe_hex::<u32>, default_value = "0x20000000")]
    ram_origin: u32,

    /// PERIPH region size in bytes
    #[arg(long, value_parser=maybe_hex::<u32>, default_value = "0x1000")]
    periph_size: u32,

    /// PERIPH region base address
    #[arg(long, value_parser=maybe_hex::<u32>, default_value = "0x01000000")]
    periph_origin: u32,

    /// Safety bound on the number of `step` calls, in case the guest
    /// never reaches `_exit`
    #[arg(long, default_value_t = 10_000_000)]
    max_steps: u64,
}

const SERIAL_TX_DATA: u32 = 0x00;
const SERIAL_TX_READY: u32 = 0x01;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() {
    init_logging();
    let args = Args::parse();

    let mut device = Device::new(
        args.rom_size,
        args.rom_origin,
        args.ram_size,
        args.ram_origin,
        args.periph_size,
        args.periph_origin,
    );

    let loaded = match rv32_elf::load_elf(&mut device, &args.input) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("failed to load {}: {e}", args.input);
            std::process::exit(1);
        }
    };
    device.set_pc(loaded.entry);
    log::info!(
        "loaded {}: entry={:#010x} prog_end={:#010x} exit_addr={:#010x}",
        args.input,
        loaded.entry,
        loaded.prog_end,
        loaded.exit_addr,
    );

    if let Some(ilp_path) = &args.ilp {
        match rv32_elf::load_ilp_schedule(ilp_path, args.rom_origin) {
            Ok(schedule) => {
                log::info!("loaded ILP schedule {ilp_path}");
                device.load_ilp_schedule(schedule);
            }
            Err(e) => {
                log::error!("failed to load ILP schedule {ilp_path}: {e}");
                std::process::exit(1);
            }
        }
    }

    let mut stdout = std::io::stdout();
    let mut steps = 0u64;
    loop {
        if device.pc() == loaded.exit_addr {
            log::info!("reached _exit at {:#010x} after {steps} steps", device.pc());
            break;
        }
        if steps >= args.max_steps {
            log::warn!("stopped after {steps} steps without reaching _exit");
            break;
        }

        if let Err(e) = device.step() {
            log::error!("step failed at pc={:#010x}: {e}", device.pc());
            std::process::exit(1);
        }
        steps += 1;

        drain_serial(&mut device, &mut stdout);
    }

    std::process::exit(0);
}

/// The guest publishes one byte at a time through the PERIPH serial TX
/// pair: it writes the byte, then sets the ready flag; the host consumes
/// it and clears the flag. Polled once per step, matching the tear-free
/// single-publisher/single-consumer discipline the PERIPH region is
/// specified to support without atomics.
fn drain_serial(device: &mut Device, out: &mut impl Write) {
    let periph = device.address_space_mut().periph.origin;
    let Ok(ready) = device.read(periph + SERIAL_TX_READY, 1) else {
        return;
    };
    if ready[0] == 0 {
        return;
    }
    if let Ok(byte) = device.read(periph + SERIAL_TX_DATA, 1) {
        let _ = out.write_all(&byte);
        let _ = out.flush();
    }
    let _ = device.write(periph + SERIAL_TX_READY, &[0]);
}
