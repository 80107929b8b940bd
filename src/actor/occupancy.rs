//! Background scan of which desktops have windows on them.
//!
//! Window enumeration is slow compared to the focus handlers, so it runs on
//! its own thread. Requests that pile up while a scan is running collapse
//! into the newest one. Results are published by swapping the snapshot
//! pointer, so readers never see a half-built set.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use tracing::{error, trace};

use crate::actor::reactor::SystemManager;
use crate::actor::tray;
use crate::layout_engine::GridLayout;
use crate::model::DesktopRegistry;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub current: usize,
    pub grid: GridLayout,
    pub desktops: Arc<DesktopRegistry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    occupied: Vec<bool>,
}

impl Occupancy {
    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = usize>) -> Occupancy {
        let mut occupied = vec![false; len];
        for index in indices {
            if let Some(cell) = occupied.get_mut(index) {
                *cell = true;
            }
        }
        Occupancy { occupied }
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied.get(index).copied().unwrap_or(false)
    }

    pub fn cells(&self) -> &[bool] { &self.occupied }
}

#[derive(Clone)]
pub struct OccupancyHandle {
    requests: Sender<ScanRequest>,
    snapshot: Arc<RwLock<Arc<Occupancy>>>,
}

impl OccupancyHandle {
    pub fn request(&self, request: ScanRequest) {
        if self.requests.send(request).is_err() {
            trace!("Occupancy scanner is gone, dropping scan request");
        }
    }

    pub fn snapshot(&self) -> Arc<Occupancy> { self.snapshot.read().clone() }

    pub fn is_occupied(&self, index: usize) -> bool { self.snapshot.read().is_occupied(index) }
}

pub struct OccupancyScanner {
    system: SystemManager,
    requests: Receiver<ScanRequest>,
    snapshot: Arc<RwLock<Arc<Occupancy>>>,
    tray_tx: Option<tray::Sender>,
}

impl OccupancyScanner {
    /// Starts the scanner thread. It exits once every handle is dropped.
    pub fn spawn(system: SystemManager, tray_tx: Option<tray::Sender>) -> OccupancyHandle {
        let (requests_tx, requests) = crossbeam_channel::unbounded();
        let snapshot = Arc::new(RwLock::new(Arc::new(Occupancy::default())));
        let scanner = OccupancyScanner {
            system,
            requests,
            snapshot: snapshot.clone(),
            tray_tx,
        };
        if let Err(e) = thread::Builder::new()
            .name("occupancy".to_string())
            .spawn(move || scanner.run())
        {
            error!("Failed to start occupancy scanner: {e}");
        }
        OccupancyHandle { requests: requests_tx, snapshot }
    }

    fn run(self) {
        while let Ok(mut request) = self.requests.recv() {
            if let Some(newest) = self.requests.try_iter().last() {
                request = newest;
            }
            self.publish(&request);
        }
        trace!("Occupancy scanner exiting");
    }

    fn publish(&self, request: &ScanRequest) {
        let occupancy = scan(&self.system, request);
        *self.snapshot.write() = Arc::new(occupancy.clone());

        if let Some(tx) = &self.tray_tx {
            tx.send(tray::Event::Update(tray::Update {
                current: request.current,
                rows: request.grid.rows,
                columns: request.grid.columns,
                occupied: occupancy.occupied,
            }));
        }
    }
}

/// Marks every desktop that owns at least one top-level window.
pub fn scan(system: &SystemManager, request: &ScanRequest) -> Occupancy {
    let windows = system.windows.enumerate_windows(&mut |_| true);
    let indices = windows.into_iter().filter_map(|window| {
        let desktop = system.desktops.desktop_of_window(window)?;
        request.desktops.index_of(desktop)
    });
    Occupancy::from_indices(request.desktops.len(), indices)
}
