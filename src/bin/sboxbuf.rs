use std::path::Path;

use log::info;
use sboxbuf::buffer::BufferPool;
use sboxbuf::config::Config;
use sboxbuf::error::{Error, Result};
use sboxbuf::storage::{new_store, StorageType};

fn stamp(page_no: u32) -> Vec<u8> {
    format!("page {}", page_no).into_bytes()
}

fn main() -> Result<()> {
    let args = clap::command!()
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path")
                .default_value(""),
        )
        .arg(
            clap::Arg::new("pages")
                .short('n')
                .long("pages")
                .help("Number of pages to run the workload with")
                .value_parser(clap::value_parser!(u32))
                .default_value("16"),
        )
        .get_matches();
    let cfg = Config::new(args.get_one::<String>("config").map(String::as_str).unwrap_or(""))?;
    let num_pages = *args.get_one::<u32>("pages").unwrap_or(&16);

    let loglevel = cfg.log_level.parse::<simplelog::LevelFilter>()?;
    let mut logconfig = simplelog::ConfigBuilder::new();
    simplelog::SimpleLogger::init(loglevel, logconfig.build())?;

    if cfg.storage_type == StorageType::Disk {
        if let Some(dir) = Path::new(&cfg.data_file).parent() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let mut bpm = BufferPool::from_config(&cfg)?;
    let file = bpm.open_file(new_store(cfg.storage_type, &cfg.data_file)?);
    info!("running {} pages through {} frames", num_pages, bpm.pool_size());

    // allocate and stamp every page
    let mut pages = vec![];
    for _ in 0..num_pages {
        let (page_no, handle) = bpm.alloc_page(file)?;
        let data = stamp(page_no);
        bpm.page_mut(&handle)?.as_mut()[..data.len()].copy_from_slice(&data);
        bpm.unpin_page(file, page_no, true)?;
        pages.push(page_no);
    }

    // read them back, evicted pages come back from the store
    for &page_no in &pages {
        let handle = bpm.read_page(file, page_no)?;
        let data = stamp(page_no);
        if bpm.page(&handle)?.as_ref()[..data.len()] != data[..] {
            return Err(Error::Internal(format!("page {} lost its content", page_no)));
        }
        bpm.unpin_page(file, page_no, false)?;
    }

    if let Some(&first) = pages.first() {
        bpm.dispose_page(file, first)?;
    }

    println!("{}", bpm.describe_state());
    bpm.flush_file(file)?;
    println!("{:?}", bpm.stats());
    Ok(())
}
