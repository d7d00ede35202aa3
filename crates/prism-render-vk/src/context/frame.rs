// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use prism_render::{ClearValues, FrameStatus};
use tracing::{debug, trace, warn};

use super::{Acquired, VkContext};
use crate::driver::{Created, Driver, FramePresent, FrameSubmit};
use crate::VkError;

impl<D: Driver> VkContext<D> {
    /// Renders one frame.
    ///
    /// 1. wait for the current slot's fence (at most `frames_in_flight`
    ///    frames run ahead of the GPU)
    /// 2. acquire an image, signalling the slot's `image_available`
    /// 3. wait for whichever older slot still owns that image
    /// 4. hand the image to the current slot
    /// 5. reset the slot fence and submit the image's command buffer
    /// 6. present, waiting on `render_finished`
    /// 7. advance the ring
    ///
    /// A frame that fails between 2 and 5 keeps its image; the next call
    /// resumes at 3 instead of acquiring again on a semaphore that is still
    /// signalled.
    ///
    /// Only the colour part of `clear` applies; there is no depth attachment.
    pub fn begin_frame(&mut self, clear: &ClearValues) -> Result<FrameStatus, VkError> {
        if self.paused {
            return Ok(FrameStatus::Skipped);
        }
        if self.chain.is_none() {
            self.rebuild_swapchain()?;
            if self.chain.is_none() {
                return Ok(FrameStatus::Skipped);
            }
        }

        let slot = *self.ring.current();
        self.wait_fence(slot.in_flight)?;

        let Some(swapchain) = self.chain.as_ref().map(|c| c.swapchain) else {
            return Ok(FrameStatus::Skipped);
        };
        let acquired = match self.acquired {
            Some(acquired) => {
                trace!(image = acquired.image_index, "vk: resuming frame on held image");
                acquired
            }
            None => {
                let result = self.ledger.driver_mut().acquire_next_image(
                    swapchain,
                    u64::MAX,
                    slot.image_available,
                );
                match result {
                    Ok((image_index, suboptimal)) => Acquired {
                        image_index,
                        suboptimal,
                    },
                    Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                        debug!("vk: swapchain out of date on acquire; rebuilding");
                        self.rebuild_swapchain()?;
                        return Ok(FrameStatus::Skipped);
                    }
                    Err(e) => return Err(VkError::Acquire(e)),
                }
            }
        };
        self.acquired = Some(acquired);
        let image_index = acquired.image_index;
        let image = image_index as usize;

        let previous_owner = self
            .chain
            .as_ref()
            .and_then(|c| c.images.get(image))
            .ok_or(VkError::Acquire(vk::Result::ERROR_UNKNOWN))?
            .owner;
        if let Some(fence) = previous_owner.filter(|&f| f != slot.in_flight) {
            trace!(image, "vk: image still owned by an older frame");
            self.wait_fence(fence)?;
        }

        let Some(chain) = self.chain.as_mut() else {
            return Ok(FrameStatus::Skipped);
        };
        chain.images[image].owner = Some(slot.in_flight);
        let command_buffer = chain.images[image].command_buffer;
        // Safe to re-record: the fence of this buffer's last submit was
        // waited on above.
        if let Some(color) = clear
            .requested_color()
            .filter(|c| *c != chain.images[image].clear_color)
        {
            let mut recording = chain.draw_recording(image);
            recording.clear_color = color;
            self.ledger
                .driver_mut()
                .record_draw(command_buffer, &recording)
                .map_err(VkError::Recording)?;
            chain.images[image].clear_color = color;
        }

        let driver = self.ledger.driver_mut();
        driver
            .reset_fence(slot.in_flight)
            .map_err(VkError::FenceReset)?;
        let submitted = driver.queue_submit(
            self.queue,
            &FrameSubmit {
                command_buffer,
                wait_semaphore: slot.image_available,
                wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                signal_semaphore: slot.render_finished,
                fence: slot.in_flight,
            },
        );
        if let Err(e) = submitted {
            // Nothing will signal the reset fence; a failed submit leaves
            // the semaphore and the held image untouched.
            if let Err(renew) = self.renew_fence(image, previous_owner) {
                warn!("vk: could not replace the frame fence after a failed submit: {renew}");
            }
            return Err(VkError::Submit(e));
        }
        self.acquired = None;

        let presented = self.ledger.driver_mut().queue_present(
            self.queue,
            &FramePresent {
                swapchain,
                image_index,
                wait_semaphore: slot.render_finished,
            },
        );
        self.ring.advance();

        let suboptimal = match presented {
            Ok(suboptimal) => suboptimal || acquired.suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => true,
            Err(e) => return Err(VkError::Present(e)),
        };
        if suboptimal {
            debug!("vk: swapchain suboptimal or out of date on present; rebuilding");
            self.rebuild_swapchain()?;
        }
        Ok(FrameStatus::Presented {
            image_index,
            suboptimal,
        })
    }

    /// Swaps the current slot's fence for a fresh signalled one and gives
    /// `image` back to its previous owner. Every other image still pointing
    /// at the old fence had its work waited on before the reset.
    fn renew_fence(
        &mut self,
        image: usize,
        previous_owner: Option<vk::Fence>,
    ) -> Result<(), VkError> {
        let stale = self.ring.current().in_flight;
        self.ledger
            .driver_mut()
            .device_wait_idle()
            .map_err(VkError::WaitIdle)?;
        let fresh = self
            .ledger
            .create(|d| d.create_fence(true), Created::Fence)
            .map_err(VkError::SyncObjects)?;
        self.ledger.retire(Created::Fence(stale));
        self.ring.current_mut().in_flight = fresh;

        if let Some(chain) = self.chain.as_mut() {
            for (i, swap_image) in chain.images.iter_mut().enumerate() {
                if i == image {
                    swap_image.owner = previous_owner.filter(|&f| f != stale);
                } else if swap_image.owner == Some(stale) {
                    swap_image.owner = None;
                }
            }
        }
        debug!(?stale, ?fresh, "vk: frame fence replaced after failed submit");
        Ok(())
    }

    /// Swaps the current slot's `image_available` for a fresh semaphore. The
    /// old one still carries the signal of an acquire that was never
    /// consumed. The caller must have idled the device.
    pub(super) fn renew_image_available(&mut self) -> Result<(), VkError> {
        let stale = self.ring.current().image_available;
        let fresh = self
            .ledger
            .create(|d| d.create_semaphore(), Created::Semaphore)
            .map_err(VkError::SyncObjects)?;
        self.ledger.retire(Created::Semaphore(stale));
        self.ring.current_mut().image_available = fresh;
        debug!(?stale, ?fresh, "vk: dropped held image; acquire semaphore replaced");
        Ok(())
    }

    fn wait_fence(&mut self, fence: vk::Fence) -> Result<(), VkError> {
        match self
            .ledger
            .driver_mut()
            .wait_for_fence(fence, self.timeout_ns)
        {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(VkError::TimedOut),
            Err(e) => Err(VkError::FenceWait(e)),
        }
    }
}
