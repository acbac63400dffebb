//! Host doubles for the pieces the crate only sees through traits: a small
//! FreeRTOS-like kernel and a log sink that keeps what it is given.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, Once};
use std::thread::{self, ThreadId};

use log::{LevelFilter, Log, Metadata, Record};

use crate::backend::{Kernel, WakeToken};
use crate::lock::LockRef;
use crate::registry::MutexRegistry;

const SLOTS: usize = 8;

#[derive(Default)]
struct Slot {
    holder: Option<ThreadId>,
    depth: u32,
    recursive: bool,
}

/// Kernel double. Tasks are threads, a native mutex is an index into `slots`.
pub struct SimKernel {
    registry: MutexRegistry<usize, SLOTS>,
    slots: Mutex<[Slot; SLOTS]>,
    freed: Condvar,
    created: AtomicUsize,
    fail_create: AtomicBool,
    woken: AtomicBool,
    yields: AtomicUsize,
}

impl SimKernel {
    pub fn new() -> SimKernel {
        SimKernel {
            registry: MutexRegistry::new(),
            slots: Mutex::new(Default::default()),
            freed: Condvar::new(),
            created: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            woken: AtomicBool::new(false),
            yields: AtomicUsize::new(0),
        }
    }

    /// Whether ISR operations report a higher priority task as woken.
    pub fn set_woken(&self, woken: bool) {
        self.woken.store(woken, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn yields(&self) -> usize {
        self.yields.load(Ordering::SeqCst)
    }

    /// Nesting depth of the native mutex behind `lock`, 0 when free or never
    /// mapped.
    pub fn holder_count<'a>(&self, lock: impl Into<LockRef<'a>>) -> u32 {
        match self.registry.get(lock.into()) {
            Some(m) => self.slots.lock().unwrap()[m].depth,
            None => 0,
        }
    }

    pub fn was_recursive<'a>(&self, lock: impl Into<LockRef<'a>>) -> bool {
        match self.registry.get(lock.into()) {
            Some(m) => self.slots.lock().unwrap()[m].recursive,
            None => false,
        }
    }

    fn wake_token(&self) -> WakeToken {
        WakeToken::from_woken(self.woken.load(Ordering::SeqCst))
    }

    fn put_back(&self, mutex: usize) {
        let mut slots = self.slots.lock().unwrap();
        let slot = &mut slots[mutex];
        assert!(slot.depth > 0, "giving a mutex nobody holds");
        slot.depth -= 1;
        if slot.depth == 0 {
            slot.holder = None;
            self.freed.notify_all();
        }
    }
}

impl Kernel for SimKernel {
    type Mutex = usize;

    fn native_mutex(&self, lock: LockRef<'_>, recursive: bool) -> Option<usize> {
        assert_eq!(recursive, lock.is_recursive());
        self.registry.get_or_create(lock, |recursive| {
            if self.fail_create.load(Ordering::SeqCst) {
                return None;
            }
            let id = self.created.fetch_add(1, Ordering::SeqCst);
            if id >= SLOTS {
                return None;
            }
            self.slots.lock().unwrap()[id].recursive = recursive;
            Some(id)
        })
    }

    fn take(&self, mutex: usize, recursive: bool) {
        let me = thread::current().id();
        let mut slots = self.slots.lock().unwrap();
        loop {
            match slots[mutex].holder {
                None => {
                    slots[mutex].holder = Some(me);
                    slots[mutex].depth = 1;
                    return;
                }
                Some(holder) if holder == me && recursive => {
                    slots[mutex].depth += 1;
                    return;
                }
                Some(_) => {}
            }
            slots = self.freed.wait(slots).unwrap();
        }
    }

    fn give(&self, mutex: usize, _recursive: bool) {
        self.put_back(mutex);
    }

    fn take_from_isr(&self, mutex: usize) -> Option<WakeToken> {
        let mut slots = self.slots.lock().unwrap();
        let slot = &mut slots[mutex];
        if slot.holder.is_some() {
            return None;
        }
        slot.holder = Some(thread::current().id());
        slot.depth = 1;
        Some(self.wake_token())
    }

    fn give_from_isr(&self, mutex: usize) -> WakeToken {
        self.put_back(mutex);
        self.wake_token()
    }

    fn yield_from_isr(&self, _token: WakeToken) {
        self.yields.fetch_add(1, Ordering::SeqCst);
    }
}

struct CaptureLogger {
    lines: Mutex<Vec<(ThreadId, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let line = record.args().to_string();
        self.lines.lock().unwrap().push((thread::current().id(), line));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};
static LOGGER_INIT: Once = Once::new();

pub fn init_logger() {
    LOGGER_INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Lines logged so far by the calling thread.
pub fn thread_logs() -> Vec<String> {
    let me = thread::current().id();
    LOGGER
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(id, _)| *id == me)
        .map(|(_, line)| line.clone())
        .collect()
}
