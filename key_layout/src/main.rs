//! Interactive probe for the keyboard layout grid: prints the grid
//! geometry and resolves typed coordinates to keys.

use key_layout::Layout;
use std::io::{self, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              AirKey Layout Grid Probe                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let layout = Layout::default();

    println!("  {} keys:", layout.key_count());
    for rect in layout.rects() {
        println!(
            "    {:<9}  x={:>6.1}  y={:>6.1}  w={:>6.1}  h={:>6.1}",
            rect.key.label(),
            rect.x,
            rect.y,
            rect.w,
            rect.h
        );
    }
    println!();

    loop {
        let line = read_line("Probe \"x y\" (or q to quit): ");
        if line.trim().eq_ignore_ascii_case("q") {
            println!("\nGoodbye!\n");
            break;
        }
        let mut parts = line.split_whitespace();
        let (x, y) = match (
            parts.next().and_then(|p| p.parse::<f32>().ok()),
            parts.next().and_then(|p| p.parse::<f32>().ok()),
        ) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                println!("  ⚠  Enter two numbers, e.g. \"120 140\".\n");
                continue;
            }
        };
        match layout.resolve(x, y) {
            Some(key) => println!("  ({:.1}, {:.1}) → {}\n", x, y, key.label()),
            None      => println!("  ({:.1}, {:.1}) → no key\n", x, y),
        }
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
