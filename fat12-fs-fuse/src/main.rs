#[macro_use]
extern crate log;

mod logging;

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use fat12_fs::{BlockDevice, Dir, FsError, FsResult, Volume, BLOCK_SZ, ROOT_DIR_PATH};

/// A disk image on the host file system, read one sector at a time
struct BlockFile {
    file: Mutex<File>,
    blocks: usize,
}

impl BlockFile {
    /// Only whole sectors count; a trailing partial sector is ignored.
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let blocks = (file.metadata()?.len() / BLOCK_SZ as u64) as usize;
        Ok(Self {
            file: Mutex::new(file),
            blocks,
        })
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> FsResult<()> {
        if block_id >= self.blocks {
            return Err(FsError::Unavailable);
        }
        let buf = buf.get_mut(..BLOCK_SZ).ok_or(FsError::InvalidArgument)?;
        let mut file = self.file.lock().map_err(|_| FsError::Unavailable)?;
        file.seek(SeekFrom::Start((block_id * BLOCK_SZ) as u64))
            .and_then(|_| file.read_exact(buf))
            .map_err(|err| {
                warn!("read sector {}: {}", block_id, err);
                FsError::Unavailable
            })
    }

    fn num_blocks(&self) -> usize {
        self.blocks
    }
}

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Fs(FsError),
    Usage(String),
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<FsError> for CliError {
    fn from(err: FsError) -> Self {
        CliError::Fs(err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(err) => write!(f, "{}", err),
            CliError::Fs(err) => write!(f, "{}", err),
            CliError::Usage(msg) => write!(f, "{}", msg),
        }
    }
}

fn main() {
    let matches = App::new("FAT12 image reader")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("image")
                .short("i")
                .long("image")
                .takes_value(true)
                .required(true)
                .help("Path of the FAT12 disk image"),
        )
        .arg(
            Arg::with_name("first-sector")
                .short("s")
                .long("first-sector")
                .takes_value(true)
                .default_value("0")
                .help("Sector holding the boot sector of the volume"),
        )
        .arg(
            Arg::with_name("log")
                .short("l")
                .long("log")
                .takes_value(true)
                .possible_values(&["off", "error", "warn", "info", "debug", "trace"])
                .help("Log level, overrides the LOG build setting"),
        )
        .subcommand(SubCommand::with_name("info").about("Show boot sector fields"))
        .subcommand(SubCommand::with_name("ls").about("List the root directory"))
        .subcommand(
            SubCommand::with_name("cat")
                .about("Write a file of the root directory to stdout")
                .arg(
                    Arg::with_name("name")
                        .required(true)
                        .index(1)
                        .help("8.3 file name, e.g. README.TXT"),
                ),
        )
        .get_matches();

    logging::init(matches.value_of("log"));
    if let Err(err) = run(&matches) {
        eprintln!("fat12-fs-fuse: {}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), CliError> {
    let image = matches.value_of("image").unwrap_or_default();
    let first_sector = matches
        .value_of("first-sector")
        .unwrap_or("0")
        .parse::<usize>()
        .map_err(|err| CliError::Usage(format!("--first-sector: {}", err)))?;
    let bdev: Arc<dyn BlockDevice> = Arc::new(BlockFile::open(image)?);
    let volume = Volume::mount(bdev, first_sector)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match matches.subcommand() {
        ("info", _) => info(&volume, &mut out)?,
        ("ls", _) => ls(&volume, &mut out)?,
        ("cat", Some(sub)) => {
            cat(&volume, sub.value_of("name").unwrap_or_default(), &mut out)?
        }
        (other, _) => return Err(CliError::Usage(format!("unknown command {:?}", other))),
    }
    volume.unmount();
    Ok(())
}

fn info(volume: &Volume, out: &mut impl Write) -> Result<(), CliError> {
    let bs = volume.boot_sector();
    writeln!(out, "label:               {}", bs.label())?;
    writeln!(out, "type:                {}", bs.fs_type_str())?;
    writeln!(out, "oem:                 {}", String::from_utf8_lossy(&bs.oem_name))?;
    writeln!(out, "serial:              {:08X}", bs.volume_id)?;
    writeln!(out, "media:               {:#04x}", bs.media_type)?;
    writeln!(out, "total sectors:       {}", bs.total_sectors())?;
    writeln!(out, "sectors per cluster: {}", bs.sectors_per_cluster)?;
    writeln!(out, "reserved sectors:    {}", bs.reserved_sectors)?;
    writeln!(out, "fat sectors:         {} x {}", bs.fat_size, bs.fat_count)?;
    writeln!(out, "root entries:        {}", bs.root_entry_count)?;
    Ok(())
}

fn attr_string(entry: &fat12_fs::DirEntry) -> String {
    [
        (entry.is_directory, 'd'),
        (entry.is_archived, 'a'),
        (entry.is_readonly, 'r'),
        (entry.is_hidden, 'h'),
        (entry.is_system, 's'),
    ]
    .iter()
    .map(|&(set, c)| if set { c } else { '-' })
    .collect()
}

fn ls(volume: &Volume, out: &mut impl Write) -> Result<(), CliError> {
    let dir = Dir::open(volume, ROOT_DIR_PATH)?;
    for entry in dir {
        writeln!(
            out,
            "{} {} {} {:>10} {}",
            attr_string(&entry),
            entry.creation_date,
            entry.creation_time,
            entry.size,
            entry.name
        )?;
    }
    Ok(())
}

fn cat(volume: &Volume, name: &str, out: &mut impl Write) -> Result<(), CliError> {
    let mut file = fat12_fs::File::open(volume, name)?;
    let mut buf = [0u8; 4096];
    loop {
        let len = file.read(&mut buf)?;
        if len == 0 {
            break;
        }
        out.write_all(&buf[..len])?;
    }
    file.close();
    Ok(())
}
