// WireCL REPL - Read-Print Loop
//
// Reads s-expressions and echoes them back through the printer.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io;
use wirecl::printer::print_to_string;
use wirecl::reader::{read_all, Reader};
use wirecl::readtable::Readtable;
use wirecl::stream::Stream;
use wirecl::symbol::SymbolTable;

fn main() -> io::Result<()> {
    let mut symbols = SymbolTable::new();
    let readtable = Readtable::new();

    // With a file argument, read every form from it and print them back
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        let file = std::fs::File::open(&args[1])?;
        let mut stream = Stream::from_reader(file);

        let mut values = Vec::new();
        {
            let mut reader = Reader::new(&mut stream, &mut symbols, &readtable);
            loop {
                match reader.try_read() {
                    Ok(Some(value)) => values.push(value),
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("Read error: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }

        for value in &values {
            println!("{}", print_to_string(&symbols, value));
        }
        return Ok(());
    }

    println!("WireCL v{} - S-Expression Reader", env!("CARGO_PKG_VERSION"));
    println!("Forms are echoed back readably. Type (quit) or Ctrl-D to exit");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    if rl.load_history("history.txt").is_err() {
        println!("No previous history.");
    }

    let mut code_buffer = String::new();

    loop {
        let prompt = if code_buffer.is_empty() {
            "WIRECL> "
        } else {
            ".....> "
        };

        let readline = rl.readline(prompt);
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                let trimmed_line = line.trim();
                if code_buffer.is_empty() && (trimmed_line == "(quit)" || trimmed_line == "(exit)")
                {
                    println!("Goodbye!");
                    break;
                }

                if !line.trim().is_empty() {
                    code_buffer.push_str(&line);
                    code_buffer.push('\n');
                }

                if is_balanced(&code_buffer) {
                    let buffered = code_buffer.clone();
                    code_buffer.clear();
                    if buffered.trim().is_empty() {
                        continue;
                    }

                    match read_all(&buffered, &mut symbols, &readtable) {
                        Ok(values) => {
                            for value in &values {
                                println!("{}", print_to_string(&symbols, value));
                            }
                        }
                        Err(e) => {
                            println!("Read error: {}", e);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history("history.txt");
    Ok(())
}

/// Whether the buffered input forms a complete expression.
///
/// Tracks strings, multi-escape regions, single escapes and line comments
/// so delimiters inside them do not count.
fn is_balanced(s: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut in_pipe = false;
    let mut escape = false;
    let mut in_comment = false;

    for c in s.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }

        if escape {
            escape = false;
            continue;
        }

        match c {
            '\\' => escape = true,
            '"' if !in_pipe => in_string = !in_string,
            '|' if !in_string => in_pipe = !in_pipe,
            ';' if !in_string && !in_pipe => in_comment = true,
            '(' if !in_string && !in_pipe => depth += 1,
            ')' if !in_string && !in_pipe => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string && !in_pipe
}
