//! WebAssembly bindings for Flow Lenia Animation.
//!
//! Provides a thin wrapper around `AnimationReader` over in-memory bytes so
//! browser viewers can scrub through a `.flwa` file.

use std::io::Cursor;

use wasm_bindgen::prelude::*;

use crate::{
    animation::{AnimationReader, CodecRegistry},
    schema::ReaderConfig,
};

/// Initialize WASM module with panic hook and logging.
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages in browser
    console_error_panic_hook::set_once();

    // Initialize WASM logger
    wasm_logger::init(wasm_logger::Config::default());
}

/// WebAssembly wrapper for an animation loaded into memory.
#[wasm_bindgen]
pub struct WasmAnimation {
    reader: AnimationReader<Cursor<Vec<u8>>>,
}

#[wasm_bindgen]
impl WasmAnimation {
    /// Open an animation from the raw file contents.
    ///
    /// # Arguments
    /// * `bytes` - Complete `.flwa` file
    /// * `config_json` - Optional JSON string containing ReaderConfig
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: Vec<u8>, config_json: Option<String>) -> Result<WasmAnimation, JsValue> {
        let config: ReaderConfig = match config_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config JSON: {e}")))?,
            None => ReaderConfig::default(),
        };

        let reader =
            AnimationReader::with_config(Cursor::new(bytes), config, CodecRegistry::default())
                .map_err(|e| JsValue::from_str(&format!("Invalid animation: {e}")))?;

        Ok(WasmAnimation { reader })
    }

    /// Get the header as a JS object.
    #[wasm_bindgen(js_name = getHeader)]
    pub fn get_header(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.reader.header())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Get total number of frames.
    #[wasm_bindgen(js_name = frameCount)]
    pub fn frame_count(&self) -> u64 {
        self.reader.frame_count()
    }

    /// Get time step per frame.
    #[wasm_bindgen]
    pub fn dt(&self) -> f32 {
        self.reader.dt()
    }

    /// Get all values of a frame, channel-major.
    #[wasm_bindgen(js_name = getFrame)]
    pub fn get_frame(&mut self, index: u64) -> Result<js_sys::Float32Array, JsValue> {
        let frame = self
            .reader
            .get_frame(index)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(js_sys::Float32Array::from(frame.data()))
    }

    /// Get one `height * width` slice of a channel for heatmap rendering.
    #[wasm_bindgen(js_name = getSlice)]
    pub fn get_slice(
        &mut self,
        index: u64,
        channel: usize,
        z: usize,
    ) -> Result<js_sys::Float32Array, JsValue> {
        let frame = self
            .reader
            .get_frame(index)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let slice = frame
            .slice(channel, z)
            .ok_or_else(|| JsValue::from_str("Channel or depth out of range"))?;
        Ok(js_sys::Float32Array::from(slice))
    }

    /// Get frame statistics as a JS object.
    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&mut self, index: u64) -> Result<JsValue, JsValue> {
        let frame = self
            .reader
            .get_frame(index)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_wasm_bindgen::to_value(&frame.stats())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Get total mass across all channels of a frame.
    #[wasm_bindgen(js_name = totalMass)]
    pub fn total_mass(&mut self, index: u64) -> Result<f32, JsValue> {
        self.reader
            .get_frame(index)
            .map(|frame| frame.total_mass())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
