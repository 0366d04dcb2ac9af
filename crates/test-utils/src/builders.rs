#![allow(dead_code)]

use rigdeploy::config::{FleetFile, RawFleetFile, Rig, Settings};

/// Builder for `FleetFile` to simplify test setup.
pub struct FleetBuilder {
    fleet: RawFleetFile,
}

impl FleetBuilder {
    pub fn new() -> Self {
        Self {
            fleet: RawFleetFile {
                rigs: Vec::new(),
                settings: Settings::default(),
            },
        }
    }

    pub fn with_rig(mut self, rig: Rig) -> Self {
        self.fleet.rigs.push(rig);
        self
    }

    /// `count` rqminer rigs named `rig-0`, `rig-1`, ...
    pub fn with_rigs(mut self, count: usize) -> Self {
        for i in 0..count {
            self.fleet.rigs.push(RigBuilder::new(&format!("rig-{i}")).build());
        }
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.fleet.settings = settings;
        self
    }

    pub fn build(self) -> FleetFile {
        FleetFile::try_from(self.fleet).expect("Failed to build valid fleet from builder")
    }

    /// The fleet without validation, for feeding odd shapes to the engine.
    pub fn build_unchecked(self) -> FleetFile {
        FleetFile::new_unchecked(self.fleet.rigs, self.fleet.settings)
    }
}

impl Default for FleetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `Rig`.
pub struct RigBuilder {
    rig: Rig,
}

impl RigBuilder {
    pub fn new(context: &str) -> Self {
        Self {
            rig: Rig {
                context: context.to_string(),
                thread_count: "4".to_string(),
                label: format!("{context}-label"),
                backend: "rqminer".to_string(),
                url: "https://pool.example/api".to_string(),
                public_id: "public-id".to_string(),
            },
        }
    }

    pub fn backend(mut self, backend: &str) -> Self {
        self.rig.backend = backend.to_string();
        self
    }

    pub fn thread_count(mut self, n: u32) -> Self {
        self.rig.thread_count = n.to_string();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.rig.label = label.to_string();
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.rig.url = url.to_string();
        self
    }

    pub fn public_id(mut self, id: &str) -> Self {
        self.rig.public_id = id.to_string();
        self
    }

    pub fn build(self) -> Rig {
        self.rig
    }
}
