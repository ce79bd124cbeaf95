pub mod bitmap_font;
pub mod overlay_scene;
pub mod raster_painter;
