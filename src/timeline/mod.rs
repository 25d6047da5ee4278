pub mod playhead;
