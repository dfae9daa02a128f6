use flock_core::{DeviceHints, FrameInput, PointerCell, Simulation, SimulationConfig, Viewport};
use flock_shared::load_config;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Floats per agent in the buffer returned by [`FlockBackground::poses`]:
/// x, y, heading, size, hue.
pub const POSE_STRIDE: usize = 5;

/// Browser binding for the flocking background.
///
/// The page owns the canvas and the `requestAnimationFrame` loop: it calls
/// `step(performance.now())`, then draws from `poses()` using
/// `appearance_json()`. Pointer moves go to `pointer_moved`, resizes to
/// `resize` / `resize_from_window`.
#[wasm_bindgen]
pub struct FlockBackground {
    sim: Simulation,
    pointer: PointerCell,
    start_ms: Option<f64>,
    last_frame_ms: Option<f64>,
    pose_buffer: Vec<f32>,
}

#[wasm_bindgen]
impl FlockBackground {
    /// `config_json` may be empty or a partial config document. `seed` is
    /// drawn from `Math.random` when omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, seed: Option<f64>) -> Result<FlockBackground, JsValue> {
        let config = match config_json.as_deref().map(str::trim) {
            Some(json) if !json.is_empty() => {
                load_config(json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            _ => SimulationConfig::default(),
        };
        let seed = seed.unwrap_or_else(|| js_sys::Math::random() * 9_007_199_254_740_991.0) as u64;

        Ok(Self::with_config(config, seed))
    }

    fn with_config(config: SimulationConfig, seed: u64) -> FlockBackground {
        FlockBackground {
            sim: Simulation::new(config, seed),
            pointer: PointerCell::new(),
            start_ms: None,
            last_frame_ms: None,
            pose_buffer: Vec::new(),
        }
    }

    /// Re-classifies the device and reconciles the population. Returns the
    /// new agent count.
    pub fn resize(&mut self, width: f64, height: f64, user_agent: &str) -> usize {
        let count = self.sim.resize_with_hints(
            Viewport::new(width as f32, height as f32),
            &DeviceHints::new(user_agent),
        );
        console_log!(
            "flock resized to {}x{}: {} agents ({:?})",
            width,
            height,
            count,
            self.sim.device()
        );
        count
    }

    /// `resize` using `window.innerWidth/innerHeight` and the navigator's
    /// user agent.
    pub fn resize_from_window(&mut self) -> Result<usize, JsValue> {
        let window = web_sys::window().ok_or("no global window")?;
        let width = window.inner_width()?.as_f64().ok_or("innerWidth is not a number")?;
        let height = window.inner_height()?.as_f64().ok_or("innerHeight is not a number")?;
        let user_agent = window.navigator().user_agent().unwrap_or_default();
        Ok(self.resize(width, height, &user_agent))
    }

    pub fn pointer_moved(&self, x: f64, y: f64, timestamp_ms: f64) {
        self.pointer.record(x as f32, y as f32, timestamp_ms);
    }

    /// Advances one tick. `now_ms` is the page clock (`performance.now()`),
    /// the same clock pointer timestamps use.
    pub fn step(&mut self, now_ms: f64) {
        let frame_rate = self.sim.config().frame_rate;
        let start = *self.start_ms.get_or_insert(now_ms);
        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 1.0 / frame_rate,
        };
        self.last_frame_ms = Some(now_ms);

        self.sim.step(&FrameInput {
            viewport: self.sim.viewport(),
            dt,
            elapsed: (now_ms - start) / 1000.0,
            now_ms,
            pointer: self.pointer.snapshot(),
        });
    }

    /// Packed poses, `POSE_STRIDE` floats per agent.
    pub fn poses(&mut self) -> js_sys::Float32Array {
        self.pose_buffer.clear();
        for pose in self.sim.poses() {
            self.pose_buffer.extend_from_slice(&[
                pose.position.x,
                pose.position.y,
                pose.heading,
                pose.size,
                pose.hue,
            ]);
        }
        js_sys::Float32Array::from(self.pose_buffer.as_slice())
    }

    pub fn pose_stride(&self) -> usize {
        POSE_STRIDE
    }

    pub fn agent_count(&self) -> usize {
        self.sim.agents().len()
    }

    /// Global appearance (colour triple, alpha, render style, background) as
    /// JSON for the page's renderer.
    pub fn appearance_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.sim.config().appearance)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn target_frame_rate(&self) -> f32 {
        self.sim.config().frame_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::DeviceClass;

    #[test]
    fn test_step_advances_from_page_clock() {
        let config = SimulationConfig {
            force_fixed_count: Some(40),
            ..Default::default()
        };
        let mut background = FlockBackground::with_config(config, 1);
        background.sim.resize(Viewport::new(320.0, 240.0), DeviceClass::Desktop);

        background.step(1000.0);
        background.step(1020.0);
        assert_eq!(background.sim.tick(), 2);
        assert!((background.sim.elapsed() - 0.02).abs() < 1e-9);
        assert_eq!(background.agent_count(), 40);
    }

    #[test]
    fn test_pointer_moves_reach_the_cell() {
        let background = FlockBackground::with_config(SimulationConfig::default(), 1);
        background.pointer_moved(5.0, 6.0, 42.0);
        assert_eq!(background.pointer.snapshot().last_move_ms, Some(42.0));
    }
}
