// SPDX-License-Identifier: CEPL-1.0
use ash::prelude::VkResult;
use tracing::{trace, warn};

use crate::driver::{Created, Driver};

/// Owns the driver and every object created through it, in creation order.
///
/// Dropping the ledger waits for the device to go idle and destroys all
/// objects in exact reverse order. A creation chain that bails out early with
/// `?` therefore unwinds whatever it had built so far.
pub(crate) struct Ledger<D: Driver> {
    driver: D,
    objects: Vec<Created>,
}

impl<D: Driver> Ledger<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            objects: Vec::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Runs one creation call and records the object on success.
    pub fn create<T: Copy>(
        &mut self,
        make: impl FnOnce(&mut D) -> VkResult<T>,
        wrap: impl FnOnce(T) -> Created,
    ) -> VkResult<T> {
        let handle = make(&mut self.driver)?;
        self.track(wrap(handle));
        Ok(handle)
    }

    pub fn track(&mut self, object: Created) {
        trace!(?object, "vk: created");
        self.objects.push(object);
    }

    #[cfg(test)]
    pub fn objects(&self) -> &[Created] {
        &self.objects
    }

    /// Destroys one object ahead of teardown and forgets it. The caller must
    /// have idled the device.
    pub fn retire(&mut self, object: Created) {
        if let Some(pos) = self.objects.iter().rposition(|o| *o == object) {
            self.objects.remove(pos);
            trace!(?object, "vk: destroy");
            self.driver.destroy(object);
        }
    }

    /// Destroys swapchain-dependent objects, newest first, keeping the rest
    /// in their original order. The caller must have idled the device.
    pub fn release_swapchain_scoped(&mut self) {
        let objects = std::mem::take(&mut self.objects);
        let mut kept = Vec::with_capacity(objects.len());
        for object in objects.into_iter().rev() {
            if object.is_swapchain_scoped() {
                self.driver.destroy(object);
            } else {
                kept.push(object);
            }
        }
        kept.reverse();
        self.objects = kept;
    }

    fn has_device(&self) -> bool {
        self.objects
            .iter()
            .any(|object| matches!(object, Created::Device(_)))
    }
}

impl<D: Driver> Drop for Ledger<D> {
    fn drop(&mut self) {
        if self.has_device() {
            if let Err(e) = self.driver.device_wait_idle() {
                warn!("vk: device_wait_idle during teardown: {e}");
            }
        }
        while let Some(object) = self.objects.pop() {
            trace!(?object, "vk: destroy");
            self.driver.destroy(object);
        }
    }
}
