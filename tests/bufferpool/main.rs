macro_rules! setup {
    ($name:ident, $sz:expr) => {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut $name = sboxbuf::buffer::BufferPool::new($sz)?;
    };
}

mod disk;
mod workload;
