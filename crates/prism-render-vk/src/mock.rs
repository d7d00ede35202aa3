// SPDX-License-Identifier: CEPL-1.0
//! Fake GPU behind the [`Driver`] seam. It hands out unique handles, logs
//! every call, enforces parent/child destroy order and the fence hazards the
//! frame loop must avoid, and can fail any call on demand.
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::{CStr, CString};
use std::rc::Rc;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use prism_render::{RenderSize, WindowTarget};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle, XlibDisplayHandle, XlibWindowHandle,
};

use crate::driver::{
    Created, DrawRecording, Driver, FramePresent, FrameSubmit, InstanceDesc, PipelineDesc,
    SwapchainDesc, VALIDATION_LAYER,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Extensions,
    Instance,
    DebugMessenger,
    Surface,
    EnumerateDevices,
    Device,
    SurfaceCapabilities,
    SurfaceFormats,
    Swapchain,
    SwapchainImages,
    ImageView,
    RenderPass,
    PipelineLayout,
    Pipeline,
    Framebuffer,
    VertexBuffer,
    CommandPool,
    CommandBuffers,
    Record,
    Semaphore,
    Fence,
    WaitFence,
    ResetFence,
    Acquire,
    Submit,
    Present,
    WaitIdle,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Create(Created),
    Destroy(Created),
    Record {
        cmd: vk::CommandBuffer,
        clear_color: [f32; 4],
    },
    /// `blocked` is true when the fence had not signaled yet.
    Wait {
        fence: vk::Fence,
        blocked: bool,
    },
    Reset(vk::Fence),
    Acquire(u32),
    Submit {
        cmd: vk::CommandBuffer,
        fence: vk::Fence,
    },
    Present(u32),
    WaitIdle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuMode {
    /// Work completes at submit.
    Eager,
    /// Work completes only once the CPU waits for it.
    Lazy,
    /// Work never completes; only `device_wait_idle` drains it.
    Stalled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FenceState {
    Signaled,
    Unsignaled,
    Pending,
}

#[derive(Clone, Copy, Debug)]
pub struct MockFamily {
    pub flags: vk::QueueFlags,
    pub present: bool,
}

impl MockFamily {
    pub fn graphics_present() -> Self {
        Self {
            flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
            present: true,
        }
    }
}

const DEVICE_BASE: u64 = 0x1000;

pub struct MockGpu {
    pub api_supported: bool,
    pub extensions: Vec<CString>,
    pub validation_layer: bool,
    pub devices: Vec<Vec<MockFamily>>,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub caps: vk::SurfaceCapabilitiesKHR,
    pub mode: GpuMode,
    /// Fail the n-th (0-based) call of an op with `ERROR_OUT_OF_HOST_MEMORY`.
    pub fail: Option<(Op, usize)>,
    pub fault_fired: bool,
    pub acquire_script: VecDeque<VkResult<u32>>,
    pub present_script: VecDeque<VkResult<bool>>,

    pub events: Vec<Event>,
    pub violations: Vec<String>,
    pub max_in_flight: usize,
    pub instance_layers: Vec<CString>,
    pub instance_extensions: Vec<CString>,
    pub chosen: Option<(vk::PhysicalDevice, u32)>,
    pub last_swapchain: Option<SwapchainDesc>,

    next_handle: u64,
    calls: HashMap<Op, usize>,
    live: Vec<Created>,
    fences: HashMap<vk::Fence, FenceState>,
    /// Binary semaphores holding a signal nobody has waited on yet.
    signaled: HashSet<vk::Semaphore>,
    cmd_fence: HashMap<vk::CommandBuffer, vk::Fence>,
    image_fence: HashMap<u32, vk::Fence>,
    image_count: u32,
    next_image: u32,
    last_acquired: Option<u32>,
}

impl Default for MockGpu {
    /// One device with one graphics+present family, BGRA8/sRGB only, and a
    /// surface that yields a 2-image swapchain sized by the window.
    fn default() -> Self {
        Self {
            api_supported: true,
            extensions: vec![
                CString::from(c"VK_KHR_surface"),
                CString::from(c"VK_KHR_xlib_surface"),
            ],
            validation_layer: false,
            devices: vec![vec![MockFamily::graphics_present()]],
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            caps: vk::SurfaceCapabilitiesKHR {
                min_image_count: 1,
                max_image_count: 3,
                current_extent: vk::Extent2D {
                    width: u32::MAX,
                    height: u32::MAX,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            mode: GpuMode::Eager,
            fail: None,
            fault_fired: false,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            events: Vec::new(),
            violations: Vec::new(),
            max_in_flight: 0,
            instance_layers: Vec::new(),
            instance_extensions: Vec::new(),
            chosen: None,
            last_swapchain: None,
            next_handle: 0,
            calls: HashMap::new(),
            live: Vec::new(),
            fences: HashMap::new(),
            signaled: HashSet::new(),
            cmd_fence: HashMap::new(),
            image_fence: HashMap::new(),
            image_count: 0,
            next_image: 0,
            last_acquired: None,
        }
    }
}

impl MockGpu {
    pub fn shared() -> Rc<RefCell<MockGpu>> {
        Rc::new(RefCell::new(MockGpu::default()))
    }

    pub fn live(&self) -> &[Created] {
        &self.live
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.get(&op).copied().unwrap_or(0)
    }

    pub fn created(&self) -> Vec<Created> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Create(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> Vec<Created> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Destroy(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    fn call(&mut self, op: Op) -> VkResult<()> {
        let count = self.calls.entry(op).or_insert(0);
        let nth = *count;
        *count += 1;
        if self.fail == Some((op, nth)) {
            self.fault_fired = true;
            return Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        }
        Ok(())
    }

    fn handle<H: Handle>(&mut self) -> H {
        self.next_handle += 1;
        H::from_raw(self.next_handle)
    }

    fn created_object(&mut self, object: Created) {
        self.live.push(object);
        self.events.push(Event::Create(object));
    }

    fn violation(&mut self, message: String) {
        self.violations.push(message);
    }

    fn is_live(&self, object: Created) -> bool {
        self.live.contains(&object)
    }

    fn fence_state(&self, fence: vk::Fence) -> Option<FenceState> {
        self.fences.get(&fence).copied()
    }

    fn signal(&mut self, semaphore: vk::Semaphore, by: &str) {
        if !self.signaled.insert(semaphore) {
            self.violation(format!("{by} signalled {semaphore:?} which was already signalled"));
        }
    }

    fn consume(&mut self, semaphore: vk::Semaphore, by: &str) {
        if !self.signaled.remove(&semaphore) {
            self.violation(format!("{by} waited on unsignalled {semaphore:?}"));
        }
    }

    fn pending(&self) -> usize {
        self.fences
            .values()
            .filter(|s| **s == FenceState::Pending)
            .count()
    }

    fn create<H: Handle + Copy>(&mut self, op: Op, wrap: impl FnOnce(H) -> Created) -> VkResult<H> {
        self.call(op)?;
        let handle: H = self.handle();
        self.created_object(wrap(handle));
        Ok(handle)
    }

    fn families(&self, phys: vk::PhysicalDevice) -> Option<&Vec<MockFamily>> {
        let index = phys.as_raw().checked_sub(DEVICE_BASE)? as usize;
        self.devices.get(index)
    }

    fn blocks_destroy(object: Created, other: Created) -> bool {
        use Created::*;
        match (object, other) {
            (Instance(_), _) => true,
            (Device(_), o) => !matches!(o, Instance(_) | Surface(_) | DebugMessenger(_)),
            (Surface(_), Swapchain(_)) => true,
            (Swapchain(_), ImageView(_)) => true,
            (ImageView(_), Framebuffer(_)) => true,
            (RenderPass(_), Framebuffer(_)) => true,
            (PipelineLayout(_), Pipeline(_)) => true,
            (CommandPool(p), CommandBuffer(q, _)) => p == q,
            _ => false,
        }
    }
}

/// Shares one [`MockGpu`] between the driver under test and the test body.
pub struct MockDriver(Rc<RefCell<MockGpu>>);

impl MockDriver {
    pub fn new(gpu: Rc<RefCell<MockGpu>>) -> Self {
        Self(gpu)
    }
}

impl Driver for MockDriver {
    fn is_api_supported(&self) -> bool {
        self.0.borrow().api_supported
    }

    fn required_instance_extensions(&self, _display: RawDisplayHandle) -> VkResult<Vec<CString>> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::Extensions)?;
        Ok(gpu.extensions.clone())
    }

    fn create_surface(
        &mut self,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        self.0.borrow_mut().create(Op::Surface, Created::Surface)
    }

    fn has_instance_layer(&self, name: &CStr) -> bool {
        self.0.borrow().validation_layer && name == VALIDATION_LAYER
    }

    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> VkResult<vk::Instance> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::Instance)?;
        gpu.instance_extensions = desc.extensions.to_vec();
        gpu.instance_layers = desc.layers.iter().map(|l| CString::from(*l)).collect();
        let handle = gpu.handle();
        gpu.created_object(Created::Instance(handle));
        Ok(handle)
    }

    fn create_debug_messenger(&mut self) -> VkResult<vk::DebugUtilsMessengerEXT> {
        self.0
            .borrow_mut()
            .create(Op::DebugMessenger, Created::DebugMessenger)
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::EnumerateDevices)?;
        Ok((0..gpu.devices.len() as u64)
            .map(|i| vk::PhysicalDevice::from_raw(DEVICE_BASE + i))
            .collect())
    }

    fn queue_families(&self, phys: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        let gpu = self.0.borrow();
        gpu.families(phys)
            .map(|families| {
                families
                    .iter()
                    .map(|f| vk::QueueFamilyProperties {
                        queue_flags: f.flags,
                        queue_count: 1,
                        ..Default::default()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn surface_support(
        &self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let gpu = self.0.borrow();
        Ok(gpu
            .families(phys)
            .and_then(|f| f.get(queue_family as usize))
            .is_some_and(|f| f.present))
    }

    fn create_device(
        &mut self,
        phys: vk::PhysicalDevice,
        queue_family: u32,
    ) -> VkResult<vk::Device> {
        let mut gpu = self.0.borrow_mut();
        let device = gpu.create(Op::Device, Created::Device)?;
        gpu.chosen = Some((phys, queue_family));
        Ok(device)
    }

    fn device_queue(&self, _queue_family: u32) -> vk::Queue {
        vk::Queue::from_raw(0x9000)
    }

    fn surface_capabilities(
        &self,
        _phys: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::SurfaceCapabilities)?;
        Ok(gpu.caps)
    }

    fn surface_formats(
        &self,
        _phys: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::SurfaceFormats)?;
        Ok(gpu.formats.clone())
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR> {
        let mut gpu = self.0.borrow_mut();
        let swapchain = gpu.create(Op::Swapchain, Created::Swapchain)?;
        gpu.image_count = desc.min_image_count;
        gpu.next_image = 0;
        gpu.last_acquired = None;
        gpu.image_fence.clear();
        gpu.last_swapchain = Some(*desc);
        Ok(swapchain)
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::SwapchainImages)?;
        if !gpu.is_live(Created::Swapchain(swapchain)) {
            gpu.violation(format!("images of dead swapchain {swapchain:?}"));
        }
        Ok((0..gpu.image_count).map(|_| gpu.handle()).collect())
    }

    fn create_image_view(
        &mut self,
        _image: vk::Image,
        _format: vk::Format,
    ) -> VkResult<vk::ImageView> {
        self.0.borrow_mut().create(Op::ImageView, Created::ImageView)
    }

    fn create_render_pass(&mut self, _format: vk::Format) -> VkResult<vk::RenderPass> {
        self.0.borrow_mut().create(Op::RenderPass, Created::RenderPass)
    }

    fn create_pipeline_layout(&mut self) -> VkResult<vk::PipelineLayout> {
        self.0
            .borrow_mut()
            .create(Op::PipelineLayout, Created::PipelineLayout)
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> VkResult<vk::Pipeline> {
        let mut gpu = self.0.borrow_mut();
        if desc.vertex_spv.is_empty() || desc.fragment_spv.is_empty() {
            gpu.violation("pipeline without shader code".to_owned());
        }
        if !gpu.is_live(Created::RenderPass(desc.render_pass)) {
            gpu.violation(format!("pipeline on dead render pass {:?}", desc.render_pass));
        }
        gpu.create(Op::Pipeline, Created::Pipeline)
    }

    fn create_framebuffer(
        &mut self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        _extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer> {
        let mut gpu = self.0.borrow_mut();
        if !gpu.is_live(Created::RenderPass(render_pass)) || !gpu.is_live(Created::ImageView(view))
        {
            gpu.violation("framebuffer over dead attachments".to_owned());
        }
        gpu.create(Op::Framebuffer, Created::Framebuffer)
    }

    fn create_vertex_buffer(
        &mut self,
        _phys: vk::PhysicalDevice,
        bytes: &[u8],
    ) -> VkResult<(vk::Buffer, vk::DeviceMemory)> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::VertexBuffer)?;
        if bytes.is_empty() {
            gpu.violation("empty vertex buffer".to_owned());
        }
        let buffer = gpu.handle();
        let memory = gpu.handle();
        gpu.created_object(Created::Buffer(buffer, memory));
        Ok((buffer, memory))
    }

    fn create_command_pool(&mut self, _queue_family: u32) -> VkResult<vk::CommandPool> {
        self.0.borrow_mut().create(Op::CommandPool, Created::CommandPool)
    }

    fn allocate_command_buffers(
        &mut self,
        pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::CommandBuffers)?;
        let mut buffers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let cmd = gpu.handle();
            gpu.created_object(Created::CommandBuffer(pool, cmd));
            buffers.push(cmd);
        }
        Ok(buffers)
    }

    fn record_draw(&mut self, cmd: vk::CommandBuffer, rec: &DrawRecording) -> VkResult<()> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::Record)?;
        let busy = gpu
            .cmd_fence
            .get(&cmd)
            .and_then(|f| gpu.fence_state(*f))
            .is_some_and(|s| s == FenceState::Pending);
        if busy {
            gpu.violation(format!("re-recorded pending command buffer {cmd:?}"));
        }
        if !gpu.is_live(Created::Framebuffer(rec.framebuffer))
            || !gpu.is_live(Created::Pipeline(rec.pipeline))
        {
            gpu.violation(format!("recorded {cmd:?} against dead objects"));
        }
        gpu.events.push(Event::Record {
            cmd,
            clear_color: rec.clear_color,
        });
        Ok(())
    }

    fn create_semaphore(&mut self) -> VkResult<vk::Semaphore> {
        self.0.borrow_mut().create(Op::Semaphore, Created::Semaphore)
    }

    fn create_fence(&mut self, signaled: bool) -> VkResult<vk::Fence> {
        let mut gpu = self.0.borrow_mut();
        let fence = gpu.create(Op::Fence, Created::Fence)?;
        let state = if signaled {
            FenceState::Signaled
        } else {
            FenceState::Unsignaled
        };
        gpu.fences.insert(fence, state);
        Ok(fence)
    }

    fn wait_for_fence(&mut self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::WaitFence)?;
        match gpu.fence_state(fence) {
            Some(FenceState::Signaled) => {
                gpu.events.push(Event::Wait {
                    fence,
                    blocked: false,
                });
                Ok(())
            }
            Some(FenceState::Pending) if gpu.mode != GpuMode::Stalled => {
                gpu.fences.insert(fence, FenceState::Signaled);
                gpu.events.push(Event::Wait {
                    fence,
                    blocked: true,
                });
                Ok(())
            }
            state => {
                if state != Some(FenceState::Pending) {
                    gpu.violation(format!("waited on {fence:?} in state {state:?}"));
                }
                gpu.events.push(Event::Wait {
                    fence,
                    blocked: true,
                });
                if timeout_ns == u64::MAX {
                    panic!("deadlock: unbounded wait on {fence:?} that will never signal");
                }
                Err(vk::Result::TIMEOUT)
            }
        }
    }

    fn reset_fence(&mut self, fence: vk::Fence) -> VkResult<()> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::ResetFence)?;
        if gpu.fence_state(fence) == Some(FenceState::Pending) {
            gpu.violation(format!("reset pending fence {fence:?}"));
        }
        gpu.fences.insert(fence, FenceState::Unsignaled);
        gpu.events.push(Event::Reset(fence));
        Ok(())
    }

    fn acquire_next_image(
        &mut self,
        swapchain: vk::SwapchainKHR,
        _timeout_ns: u64,
        signal: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::Acquire)?;
        if !gpu.is_live(Created::Swapchain(swapchain)) {
            gpu.violation(format!("acquire on dead swapchain {swapchain:?}"));
        }
        let image = match gpu.acquire_script.pop_front() {
            Some(scripted) => scripted?,
            None => {
                let image = gpu.next_image;
                gpu.next_image = (image + 1) % gpu.image_count.max(1);
                image
            }
        };
        gpu.signal(signal, "acquire");
        gpu.last_acquired = Some(image);
        gpu.events.push(Event::Acquire(image));
        Ok((image, false))
    }

    fn queue_submit(&mut self, _queue: vk::Queue, submit: &FrameSubmit) -> VkResult<()> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::Submit)?;
        let fence = submit.fence;
        let cmd = submit.command_buffer;
        if gpu.fence_state(fence) != Some(FenceState::Unsignaled) {
            gpu.violation(format!("submitted with unreset fence {fence:?}"));
        }
        let cmd_busy = gpu
            .cmd_fence
            .get(&cmd)
            .is_some_and(|f| gpu.fence_state(*f) == Some(FenceState::Pending));
        if cmd_busy {
            gpu.violation(format!("resubmitted pending command buffer {cmd:?}"));
        }
        if let Some(image) = gpu.last_acquired {
            let image_busy = gpu
                .image_fence
                .get(&image)
                .is_some_and(|f| gpu.fence_state(*f) == Some(FenceState::Pending));
            if image_busy {
                gpu.violation(format!("image {image} written while still in flight"));
            }
            gpu.image_fence.insert(image, fence);
        }
        gpu.consume(submit.wait_semaphore, "submit");
        gpu.signal(submit.signal_semaphore, "submit");
        let state = match gpu.mode {
            GpuMode::Eager => FenceState::Signaled,
            GpuMode::Lazy | GpuMode::Stalled => FenceState::Pending,
        };
        gpu.fences.insert(fence, state);
        gpu.cmd_fence.insert(cmd, fence);
        let pending = gpu.pending();
        gpu.max_in_flight = gpu.max_in_flight.max(pending);
        gpu.events.push(Event::Submit { cmd, fence });
        Ok(())
    }

    fn queue_present(&mut self, _queue: vk::Queue, present: &FramePresent) -> VkResult<bool> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::Present)?;
        // Waits run even when the presentation engine rejects the image.
        gpu.consume(present.wait_semaphore, "present");
        let suboptimal = match gpu.present_script.pop_front() {
            Some(scripted) => scripted?,
            None => false,
        };
        gpu.events.push(Event::Present(present.image_index));
        Ok(suboptimal)
    }

    fn device_wait_idle(&mut self) -> VkResult<()> {
        let mut gpu = self.0.borrow_mut();
        gpu.call(Op::WaitIdle)?;
        for state in gpu.fences.values_mut() {
            if *state == FenceState::Pending {
                *state = FenceState::Signaled;
            }
        }
        gpu.events.push(Event::WaitIdle);
        Ok(())
    }

    fn destroy(&mut self, object: Created) {
        let mut gpu = self.0.borrow_mut();
        let found = gpu.live.iter().position(|o| *o == object);
        let Some(pos) = found else {
            gpu.violation(format!("destroyed unknown object {object:?}"));
            return;
        };
        let device_level = !matches!(
            object,
            Created::Instance(_) | Created::Surface(_) | Created::DebugMessenger(_)
        );
        if device_level && gpu.pending() > 0 {
            gpu.violation(format!("destroyed {object:?} while the GPU is busy"));
        }
        gpu.live.remove(pos);
        let child = gpu
            .live
            .iter()
            .copied()
            .find(|o| MockGpu::blocks_destroy(object, *o));
        if let Some(child) = child {
            gpu.violation(format!("destroyed {object:?} before {child:?}"));
        }
        match object {
            Created::Fence(f) => {
                gpu.fences.remove(&f);
            }
            Created::Semaphore(s) => {
                gpu.signaled.remove(&s);
            }
            _ => {}
        }
        gpu.events.push(Event::Destroy(object));
    }
}

/// Window double with fixed handles and a settable framebuffer size.
pub struct TestWindow {
    pub size: RenderSize,
}

impl TestWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: RenderSize::new(width, height),
        }
    }
}

impl HasWindowHandle for TestWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        let raw = RawWindowHandle::Xlib(XlibWindowHandle::new(1));
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}

impl HasDisplayHandle for TestWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        let raw = RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0));
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

impl WindowTarget for TestWindow {
    fn framebuffer_size(&self) -> RenderSize {
        self.size
    }
}
