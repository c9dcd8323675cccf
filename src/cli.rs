// Command-line front end for narcrs.
//
// One subcommand per archive operation. Every command that modifies an
// archive loads it fully, applies all changes in memory and writes the
// result back in one step, so a failure part-way leaves the file as it was.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde_json::{Value, json};

use crate::io::{self, IoError, LoadedArchive, TransferStats, WriteStats};
use crate::narc::Archive;
use crate::tree::{NodeId, Tree, path};
use crate::yaz0::{self, DEFAULT_LEVEL};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// NARC archive tool with Yaz0 support.
#[derive(Parser, Debug)]
#[command(
    name = "narc",
    version,
    about = "Create, inspect and modify NARC archives",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats (and `list` output) as JSON.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Extract the contents of an archive.
    #[command(visible_alias = "x")]
    Extract(ExtractArgs),
    /// Create a new archive from a file or directory.
    #[command(visible_alias = "c")]
    Create(CreateArgs),
    /// Add files or directories to a new or existing archive.
    #[command(visible_alias = "a")]
    Add(AddArgs),
    /// List the contents of an archive.
    #[command(visible_alias = "l")]
    List(ArchiveArg),
    /// Delete files or directories from an archive.
    #[command(visible_alias = "d")]
    Delete(DeleteArgs),
    /// Move and/or rename an entry inside an archive.
    #[command(visible_alias = "r")]
    Rename(RenameArgs),
    /// Compress a file with Yaz0.
    Compress(CompressArgs),
    /// Decompress a Yaz0 file.
    Decompress(TransformArgs),
}

#[derive(Args, Debug)]
struct WriteFlags {
    /// Write the archive without file names.
    #[arg(long)]
    nameless: bool,

    /// Write the archive without 4-byte data alignment.
    #[arg(long = "no-align", alias = "noalign")]
    no_align: bool,

    /// Wrap the archive in Yaz0 at this level (1-9).
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(u32).range(1..=9))]
    yaz0: Option<u32>,
}

#[derive(Args, Debug)]
struct ArchiveArg {
    /// Archive file.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Archive file.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,

    /// Output directory (default: current directory).
    #[arg(value_hint = ValueHint::DirPath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Archive file to create.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,

    /// File or directory to pack. A directory's contents become the root.
    #[arg(value_hint = ValueHint::AnyPath)]
    input: PathBuf,

    #[command(flatten)]
    write: WriteFlags,
}

#[derive(Args, Debug)]
struct AddArgs {
    /// Archive file (created when missing).
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,

    /// Files or directories to add under the root.
    #[arg(required = true, value_hint = ValueHint::AnyPath)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    write: WriteFlags,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    /// Archive file.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,

    /// Paths inside the archive.
    #[arg(required = true)]
    entries: Vec<String>,
}

#[derive(Args, Debug)]
struct RenameArgs {
    /// Archive file.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,

    /// Current path inside the archive.
    from: String,

    /// New path inside the archive.
    to: String,
}

#[derive(Args, Debug)]
struct TransformArgs {
    /// Input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output file.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct CompressArgs {
    #[command(flatten)]
    files: TransformArgs,

    /// Compression level (1-9).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..=9), default_value_t = DEFAULT_LEVEL)]
    level: u32,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Extract,
    Create,
    Add,
    List,
    Delete,
    Rename,
    Compress,
    Decompress,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    /// Archive for archive commands, input file for Yaz0 commands.
    input: PathBuf,
    /// Extract directory or Yaz0 output file.
    output: Option<PathBuf>,
    host_paths: Vec<PathBuf>,
    entries: Vec<String>,
    nameless: bool,
    no_align: bool,
    yaz0_level: Option<u32>,
    level: u32,
}

impl Options {
    fn with_write_flags(mut self, flags: WriteFlags) -> Self {
        self.nameless = flags.nameless;
        self.no_align = flags.no_align;
        self.yaz0_level = flags.yaz0;
        self
    }
}

fn resolve_options(cli: Cli) -> Options {
    let force = cli.force;
    let quiet = cli.quiet;
    let verbose = cli.verbose.min(2);
    let json_output = cli.json_output;

    let base = move |command: Command, input: PathBuf| Options {
        command,
        force,
        quiet,
        verbose,
        json_output,
        input,
        output: None,
        host_paths: Vec::new(),
        entries: Vec::new(),
        nameless: false,
        no_align: false,
        yaz0_level: None,
        level: DEFAULT_LEVEL,
    };

    match cli.command {
        Cmd::Extract(args) => Options {
            output: args.output,
            ..base(Command::Extract, args.archive)
        },
        Cmd::Create(args) => Options {
            host_paths: vec![args.input],
            ..base(Command::Create, args.archive)
        }
        .with_write_flags(args.write),
        Cmd::Add(args) => Options {
            host_paths: args.paths,
            ..base(Command::Add, args.archive)
        }
        .with_write_flags(args.write),
        Cmd::List(args) => base(Command::List, args.archive),
        Cmd::Delete(args) => Options {
            entries: args.entries,
            ..base(Command::Delete, args.archive)
        },
        Cmd::Rename(args) => Options {
            entries: vec![args.from, args.to],
            ..base(Command::Rename, args.archive)
        },
        Cmd::Compress(args) => Options {
            output: Some(args.files.output),
            level: args.level,
            ..base(Command::Compress, args.files.input)
        },
        Cmd::Decompress(args) => Options {
            output: Some(args.output),
            ..base(Command::Decompress, args.input)
        },
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("narc".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn fail(context: impl std::fmt::Display, err: impl std::fmt::Display) -> i32 {
    eprintln!("narc: {context}: {err}");
    1
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("narc: json: {e}"),
    }
}

fn load(path: &Path) -> Result<LoadedArchive, i32> {
    io::read_archive_file(path).map_err(|e| fail(path.display(), e))
}

/// Yaz0 level for writing back an archive: explicit flag first, otherwise
/// keep an input that was compressed compressed.
fn output_level(opts: &Options, was_compressed: bool) -> Option<u32> {
    opts.yaz0_level
        .or(was_compressed.then_some(DEFAULT_LEVEL))
}

fn save(opts: &Options, archive: &Archive, level: Option<u32>) -> i32 {
    let stats = match io::write_archive_file(&opts.input, archive, level) {
        Ok(stats) => stats,
        Err(e) => return fail(opts.input.display(), e),
    };
    report_write(opts, &stats);
    0
}

fn report_write(opts: &Options, stats: &WriteStats) {
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "narc: wrote {}: {} files, {} bytes",
            opts.input.display(),
            stats.files,
            stats.written_size
        );
    }
    if opts.json_output {
        print_json(&json!({
            "archive": opts.input.display().to_string(),
            "files": stats.files,
            "archive_size": stats.archive_size,
            "written_size": stats.written_size,
            "yaz0_level": stats.yaz0_level,
        }));
    }
}

fn report_transfer(opts: &Options, verb: &str, stats: &TransferStats) {
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "narc: {verb} {} files, {} directories, {} bytes",
            stats.files, stats.directories, stats.bytes
        );
    }
    if opts.json_output && opts.command == Command::Extract {
        print_json(&json!({
            "command": "extract",
            "files": stats.files,
            "directories": stats.directories,
            "bytes": stats.bytes,
        }));
    }
}

/// Look up an archive path, preferring a file over a directory of the same
/// name.
fn find_entry(tree: &Tree, entry: &str) -> Option<NodeId> {
    let root = tree.root();
    tree.find_leaf(root, entry)
        .or_else(|| tree.find_branch(root, entry))
        .filter(|&id| id != root)
}

// ---------------------------------------------------------------------------
// Extract command
// ---------------------------------------------------------------------------

fn cmd_extract(opts: &Options) -> i32 {
    let loaded = match load(&opts.input) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let dest = opts.output.clone().unwrap_or_else(|| PathBuf::from("."));
    let tree = &loaded.archive.tree;
    match io::extract_branch(tree, tree.root(), &dest, opts.force) {
        Ok(stats) => {
            report_transfer(opts, "extracted", &stats);
            0
        }
        Err(e) => fail(dest.display(), e),
    }
}

// ---------------------------------------------------------------------------
// Create / add commands
// ---------------------------------------------------------------------------

fn cmd_create(opts: &Options) -> i32 {
    let mut archive = Archive {
        nameless: opts.nameless,
        has_alignment: !opts.no_align,
        ..Archive::default()
    };
    let root = archive.root();

    let mut stats = TransferStats::default();
    for input in &opts.host_paths {
        let packed = if input.is_dir() {
            io::pack_contents(&mut archive.tree, root, input)
        } else {
            io::pack_path(&mut archive.tree, root, input)
        };
        match packed {
            Ok(s) => {
                stats.files += s.files;
                stats.directories += s.directories;
                stats.bytes += s.bytes;
            }
            Err(e) => return fail(input.display(), e),
        }
    }
    report_transfer(opts, "packed", &stats);
    save(opts, &archive, opts.yaz0_level)
}

fn cmd_add(opts: &Options) -> i32 {
    let (mut archive, compressed) = if opts.input.exists() {
        match load(&opts.input) {
            Ok(l) => (l.archive, l.compressed),
            Err(code) => return code,
        }
    } else {
        log::info!("{} does not exist, creating it", opts.input.display());
        (Archive::default(), false)
    };
    if opts.nameless {
        archive.nameless = true;
    }
    if opts.no_align {
        archive.has_alignment = false;
    }

    let root = archive.root();
    for path in &opts.host_paths {
        match io::pack_path(&mut archive.tree, root, path) {
            Ok(stats) => report_transfer(opts, "added", &stats),
            Err(IoError::NotFound(p)) => {
                eprintln!("narc: {}: does not exist", p.display());
                return 1;
            }
            Err(e) => return fail(path.display(), e),
        }
    }
    save(opts, &archive, output_level(opts, compressed))
}

// ---------------------------------------------------------------------------
// List command
// ---------------------------------------------------------------------------

fn node_json(tree: &Tree, id: NodeId) -> Value {
    let name = tree.name(id).unwrap_or_default();
    match tree.contents(id) {
        Ok(contents) => json!({
            "name": name,
            "type": "file",
            "size": contents.len(),
        }),
        Err(_) => {
            let children: Vec<Value> = tree
                .children(id)
                .unwrap_or_default()
                .iter()
                .map(|&c| node_json(tree, c))
                .collect();
            json!({
                "name": name,
                "type": "directory",
                "children": children,
            })
        }
    }
}

fn cmd_list(opts: &Options) -> i32 {
    let loaded = match load(&opts.input) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let archive = &loaded.archive;
    let tree = &archive.tree;
    let root = tree.root();

    if opts.json_output {
        let entries: Vec<Value> = tree
            .children(root)
            .unwrap_or_default()
            .iter()
            .map(|&c| node_json(tree, c))
            .collect();
        let listing = json!({
            "archive": opts.input.display().to_string(),
            "compressed": loaded.compressed,
            "nameless": archive.nameless,
            "aligned": archive.has_alignment,
            "files": archive.file_count(),
            "entries": entries,
        });
        match serde_json::to_string_pretty(&listing) {
            Ok(text) => println!("{text}"),
            Err(e) => return fail("json", e),
        }
        return 0;
    }

    for (depth, id) in tree.walk(root) {
        let name = tree.name(id).unwrap_or_default();
        if opts.verbose > 0 {
            match tree.contents(id) {
                Ok(contents) => println!("{}{name}\t{}", "\t".repeat(depth), contents.len()),
                Err(_) => println!("{}{name}/", "\t".repeat(depth)),
            }
        } else {
            println!("{}{name}", "\t".repeat(depth));
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Delete / rename commands
// ---------------------------------------------------------------------------

fn cmd_delete(opts: &Options) -> i32 {
    let loaded = match load(&opts.input) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let mut archive = loaded.archive;

    let mut deleted = 0usize;
    for entry in &opts.entries {
        let Some(node) = find_entry(&archive.tree, entry) else {
            if !opts.quiet {
                eprintln!("narc: \"{entry}\" does not exist in the archive");
            }
            continue;
        };
        if let Err(e) = archive.tree.delete(node) {
            return fail(entry, e);
        }
        log::debug!("deleted {entry:?}");
        deleted += 1;
    }

    if deleted == 0 {
        return 1;
    }
    save(opts, &archive, output_level(opts, loaded.compressed))
}

fn cmd_rename(opts: &Options) -> i32 {
    let [from, to] = opts.entries.as_slice() else {
        return fail("rename", "expected <from> <to>");
    };
    let loaded = match load(&opts.input) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let mut archive = loaded.archive;

    let Some(node) = find_entry(&archive.tree, from) else {
        return fail(from, "does not exist in the archive");
    };
    let Some((parent, name)) = path::split_last(to) else {
        return fail(to, "empty destination path");
    };
    if let Err(e) = archive.tree.move_node(node, &parent, name) {
        return fail(format!("{from} -> {to}"), e);
    }
    save(opts, &archive, output_level(opts, loaded.compressed))
}

// ---------------------------------------------------------------------------
// Yaz0 commands
// ---------------------------------------------------------------------------

fn transform(opts: &Options, f: impl FnOnce(&[u8]) -> Result<Vec<u8>, IoError>) -> i32 {
    let Some(output) = &opts.output else {
        return fail("output", "missing output path");
    };
    if output.exists() && !opts.force {
        eprintln!(
            "narc: output file exists, use -f to overwrite: {}",
            output.display()
        );
        return 1;
    }
    let input = match std::fs::read(&opts.input) {
        Ok(data) => data,
        Err(e) => return fail(format!("input file: {}", opts.input.display()), e),
    };
    let result = match f(&input) {
        Ok(data) => data,
        Err(e) => return fail(opts.input.display(), e),
    };
    if let Err(e) = std::fs::write(output, &result) {
        return fail(format!("output file: {}", output.display()), e);
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "narc: {}: {} -> {} bytes",
            output.display(),
            input.len(),
            result.len()
        );
    }
    if opts.json_output {
        let command = match opts.command {
            Command::Compress => "compress",
            _ => "decompress",
        };
        print_json(&json!({
            "command": command,
            "input_size": input.len(),
            "output_size": result.len(),
            "level": (opts.command == Command::Compress).then_some(opts.level),
        }));
    }
    0
}

fn cmd_compress(opts: &Options) -> i32 {
    transform(opts, |data| Ok(yaz0::compress(data, opts.level)))
}

fn cmd_decompress(opts: &Options) -> i32 {
    transform(opts, |data| Ok(yaz0::decompress(data)?))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    let default_filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let opts = resolve_options(cli);
    let exit_code = match opts.command {
        Command::Extract => cmd_extract(&opts),
        Command::Create => cmd_create(&opts),
        Command::Add => cmd_add(&opts),
        Command::List => cmd_list(&opts),
        Command::Delete => cmd_delete(&opts),
        Command::Rename => cmd_rename(&opts),
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_opts(args: &[&str]) -> Options {
        let argv: Vec<String> = std::iter::once("narc".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).expect("cli parse failed");
        resolve_options(cli)
    }

    fn parse_err(args: &[&str]) -> bool {
        let argv = std::iter::once("narc").chain(args.iter().copied());
        Cli::try_parse_from(argv).is_err()
    }

    #[test]
    fn extract_maps_output() {
        let opts = parse_opts(&["extract", "a.narc", "out"]);
        assert_eq!(opts.command, Command::Extract);
        assert_eq!(opts.input, PathBuf::from("a.narc"));
        assert_eq!(opts.output, Some(PathBuf::from("out")));

        let opts = parse_opts(&["x", "a.narc"]);
        assert_eq!(opts.command, Command::Extract);
        assert_eq!(opts.output, None);
    }

    #[test]
    fn create_write_flags() {
        let opts = parse_opts(&[
            "create",
            "a.narc",
            "dir",
            "--nameless",
            "--no-align",
            "--yaz0",
            "6",
        ]);
        assert_eq!(opts.command, Command::Create);
        assert_eq!(opts.host_paths, [PathBuf::from("dir")]);
        assert!(opts.nameless);
        assert!(opts.no_align);
        assert_eq!(opts.yaz0_level, Some(6));
    }

    #[test]
    fn legacy_noalign_spelling() {
        let opts = parse_opts(&["c", "a.narc", "dir", "--noalign"]);
        assert!(opts.no_align);
        assert!(!opts.nameless);
    }

    #[test]
    fn add_takes_many_paths() {
        let opts = parse_opts(&["add", "a.narc", "one.bin", "dir", "two.bin"]);
        assert_eq!(opts.command, Command::Add);
        assert_eq!(opts.host_paths.len(), 3);
        assert_eq!(opts.yaz0_level, None);
        assert!(parse_err(&["add", "a.narc"]));
    }

    #[test]
    fn delete_and_rename_entries() {
        let opts = parse_opts(&["delete", "a.narc", "x/y.bin", "z"]);
        assert_eq!(opts.command, Command::Delete);
        assert_eq!(opts.entries, ["x/y.bin", "z"]);

        let opts = parse_opts(&["r", "a.narc", "old.bin", "dir/new.bin"]);
        assert_eq!(opts.command, Command::Rename);
        assert_eq!(opts.entries, ["old.bin", "dir/new.bin"]);
        assert!(parse_err(&["rename", "a.narc", "only-one"]));
    }

    #[test]
    fn compress_level_range() {
        let opts = parse_opts(&["compress", "in", "out", "--level", "3"]);
        assert_eq!(opts.command, Command::Compress);
        assert_eq!(opts.level, 3);
        assert_eq!(opts.output, Some(PathBuf::from("out")));
        assert_eq!(parse_opts(&["compress", "in", "out"]).level, DEFAULT_LEVEL);
        assert!(parse_err(&["compress", "in", "out", "--level", "0"]));
        assert!(parse_err(&["compress", "in", "out", "--level", "10"]));
        assert!(parse_err(&["create", "a.narc", "d", "--yaz0", "12"]));
    }

    #[test]
    fn global_flags() {
        let opts = parse_opts(&["--force", "--json", "decompress", "in", "out"]);
        assert!(opts.force);
        assert!(opts.json_output);
        assert_eq!(opts.command, Command::Decompress);

        let opts = parse_opts(&["list", "a.narc", "-vvv"]);
        assert_eq!(opts.verbose, 2);
        assert!(parse_err(&["-q", "-v", "list", "a.narc"]));
    }

    #[test]
    fn output_level_keeps_compression() {
        let plain = parse_opts(&["add", "a.narc", "x"]);
        assert_eq!(output_level(&plain, false), None);
        assert_eq!(output_level(&plain, true), Some(DEFAULT_LEVEL));
        let explicit = parse_opts(&["add", "a.narc", "x", "--yaz0", "2"]);
        assert_eq!(output_level(&explicit, false), Some(2));
        assert_eq!(output_level(&explicit, true), Some(2));
    }

    #[test]
    fn entry_lookup_prefers_files() {
        let mut tree = Tree::new();
        let root = tree.root();
        let dir = tree.branch_or_create(root, "same").unwrap();
        let file = tree.put_leaf(root, "same", vec![1]).unwrap();
        assert_eq!(find_entry(&tree, "same"), Some(file));
        tree.delete(file).unwrap();
        assert_eq!(find_entry(&tree, "same"), Some(dir));
        assert_eq!(find_entry(&tree, ""), None);
        assert_eq!(find_entry(&tree, "missing"), None);
    }

    #[test]
    fn list_json_shape() {
        let mut tree = Tree::new();
        let root = tree.root();
        let dir = tree.branch_or_create(root, "d").unwrap();
        tree.put_leaf(dir, "f.bin", vec![0; 5]).unwrap();
        let value = node_json(&tree, dir);
        assert_eq!(value["type"], "directory");
        assert_eq!(value["children"][0]["name"], "f.bin");
        assert_eq!(value["children"][0]["size"], 5);
    }

    #[test]
    fn fuzz_hook_tolerates_garbage() {
        fuzz_try_parse_args(&["--yaz0".into(), "create".into()]);
        fuzz_try_parse_args(&[]);
    }
}
