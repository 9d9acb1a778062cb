//! The seam between the globe and whatever shows it: surface size, frame
//! scheduling and resize notification.

/// Token for one scheduled frame. A frame delivered with any handle other
/// than the live one is stale and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationHandle(pub u64);

/// Registration in the host's resize listener registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub trait Host {
    /// Current drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Schedule one frame callback.
    fn request_frame(&mut self) -> AnimationHandle;

    /// Cancel a scheduled frame. Unknown or already-delivered handles are ignored.
    fn cancel_frame(&mut self, handle: AnimationHandle);

    fn add_resize_listener(&mut self) -> ListenerId;

    fn remove_resize_listener(&mut self, id: ListenerId);
}
