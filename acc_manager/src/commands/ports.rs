use acc_core::error::AccResult;
use acc_library::hardware::firmata::list_ports;
use colored::*;

/// Print the serial ports the OS reports
pub fn list_serial_ports() -> AccResult<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("{}", "No serial ports found. Is the board plugged in?".yellow());
        return Ok(());
    }

    println!("{}", "Serial ports:".bold());
    for port in ports {
        println!("  {:<20} {}", port.name.cyan(), port.description.dimmed());
    }
    Ok(())
}
