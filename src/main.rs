use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rx86emu::{HaltCause, LinearMemory, Reg, Runtime};

fn parse_num(s: &str) -> Result<u32, String> {
    let res = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    res.map_err(|e| format!("{e}"))
}

/// Run a flat real-mode binary image until it halts.
#[derive(Parser, Debug)]
struct Cli {
    /// Binary image loaded into guest memory
    image: PathBuf,
    /// Linear load address (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0", value_parser = parse_num)]
    load: u32,
    #[arg(long, default_value = "0", value_parser = parse_num)]
    cs: u32,
    #[arg(long, default_value = "0", value_parser = parse_num)]
    ip: u32,
    #[arg(long, default_value = "0", value_parser = parse_num)]
    sp: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let data = match fs::read(&cli.image) {
        Ok(data) => data,
        Err(error) => {
            eprintln!("{}: {}", cli.image.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let mut memory = LinearMemory::new();
    memory.load(cli.load, &data);

    let mut vm = Runtime::new(Box::new(memory));
    vm.set_reg(Reg::CS, cli.cs);
    vm.set_reg(Reg::IP, cli.ip);
    vm.set_reg(Reg::SP, cli.sp);

    let cause = vm.run();
    println!("{:?}", vm);
    match cause {
        HaltCause::GuestHalt | HaltCause::ServiceReturn => {
            println!("halted: {:?}", cause);
            ExitCode::SUCCESS
        }
        HaltCause::HostRequest => {
            println!("halted: {:?}", cause);
            ExitCode::SUCCESS
        }
        HaltCause::IllegalOpcode => {
            eprintln!("halted: {:?}", cause);
            ExitCode::FAILURE
        }
    }
}
