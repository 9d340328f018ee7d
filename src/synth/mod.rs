// Voice management layer: one voice per sounding note, driven by messages
// from the control thread. Sits above the dsp primitives.

pub mod message;
pub mod note;
pub mod registry;
pub mod voice;
