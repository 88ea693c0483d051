pub mod debug_overlay;
pub mod now_playing;
