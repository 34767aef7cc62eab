// cdecl-tree: C Declaration Parse Tree Browser

use std::io;
use std::path::PathBuf;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use cdecl_tree::source::{SearchPaths, SourceFile};
use cdecl_tree::ui::App;

/// Command line options
struct Options {
    file: PathBuf,
    search_paths: SearchPaths,
    dump: bool,
}

fn usage(program_name: &str) {
    eprintln!("Usage: {} <file.c|file.h> [-I <dir>]... [--dump]", program_name);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -I <dir>    Add a directory to the header search path (in order)");
    eprintln!("  --dump      Print the parse tree instead of starting the browser");
    eprintln!();
    eprintln!("Set RUST_LOG=debug (or trace) to follow the parser state machine.");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut file = None;
    let mut search_paths = SearchPaths::new();
    let mut dump = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dump" => dump = true,
            "-I" => {
                let dir = iter.next().ok_or("missing directory after -I")?;
                search_paths.push(dir);
            }
            dir if dir.starts_with("-I") => search_paths.push(&dir[2..]),
            other if other.starts_with('-') => return Err(format!("unknown option '{}'", other)),
            other => {
                if file.replace(PathBuf::from(other)).is_some() {
                    return Err("only one input file can be given".to_string());
                }
            }
        }
    }

    let file = file.ok_or("no input file provided")?;
    Ok(Options {
        file,
        search_paths,
        dump,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("cdecl-tree");

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!();
            usage(program_name);
            std::process::exit(2);
        }
    };

    let file = match SourceFile::open(&options.file, &options.search_paths) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filename = options.file.to_string_lossy().into_owned();
    let outcome = file.parse(&filename);

    if options.dump {
        print!("{}", outcome.tree.render());
        eprintln!("{}: {}", filename, outcome.status);
        if !outcome.status.is_completed() {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(outcome, file.text());
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
