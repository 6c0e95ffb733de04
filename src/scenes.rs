//! Built-in scenes
//!
//! Each preset pairs a scene with the render settings it was tuned for. The
//! geometry is expressed as a left fold of CSG entries, so nested expressions
//! like `c ∪ (d ∩ e)` are written as `d, ∩e, ∪c`.

use std::path::PathBuf;

use crate::config::{ConfigError, RenderConfig, SceneSource};
use crate::scene::{CsgOp, Material, Scene, SceneEntry};
use crate::sdf::Shape;
use crate::Color;

/// Scene rendered when nothing else is configured
pub const DEFAULT_SCENE: &str = "fresnel";

/// A named scene together with its preferred render settings
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    /// Default file the image is written to
    pub output: &'static str,
    build: fn() -> Vec<SceneEntry>,
    configure: fn(&mut RenderConfig),
}

impl Preset {
    pub fn entries(&self) -> Vec<SceneEntry> {
        (self.build)()
    }

    pub fn scene(&self) -> Result<Scene, ConfigError> {
        Scene::new(self.entries())
    }

    /// Render settings for this scene, starting from the defaults
    pub fn config(&self) -> RenderConfig {
        let mut config = RenderConfig {
            output: PathBuf::from(self.output),
            scene: Some(SceneSource::Preset(self.name.to_string())),
            ..RenderConfig::default()
        };
        (self.configure)(&mut config);
        config
    }
}

impl std::fmt::Debug for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preset")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("output", &self.output)
            .finish()
    }
}

static PRESETS: [Preset; 7] = [
    Preset {
        name: "basic",
        description: "Single emissive disc, no reflection or refraction",
        output: "basic-cw2.png",
        build: basic,
        configure: configure_basic,
    },
    Preset {
        name: "fresnel",
        description: "Emitter next to a glass box with Fresnel reflection",
        output: "fresnel.png",
        build: fresnel,
        configure: keep_defaults,
    },
    Preset {
        name: "lens",
        description: "Convex lens made from the intersection of two discs",
        output: "lens.png",
        build: lens,
        configure: keep_defaults,
    },
    Preset {
        name: "concave",
        description: "Concave lens carved from a box by two discs",
        output: "concave.png",
        build: concave,
        configure: keep_defaults,
    },
    Preset {
        name: "semicircle",
        description: "Half disc of glass cut by a plane",
        output: "semicircle.png",
        build: semicircle,
        configure: keep_defaults,
    },
    Preset {
        name: "beer_lambert",
        description: "Fresnel box with grey absorption",
        output: "beerlambert.png",
        build: beer_lambert,
        configure: keep_defaults,
    },
    Preset {
        name: "beer_lambert_color",
        description: "Pentagon prism absorbing red and green more than blue",
        output: "beerlambert_color.png",
        build: beer_lambert_color,
        configure: configure_beer_lambert_color,
    },
];

/// All built-in presets
pub fn presets() -> &'static [Preset] {
    &PRESETS
}

/// Look up a preset by name
pub fn find(name: &str) -> Result<&'static Preset, ConfigError> {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ConfigError::UnknownScene(name.to_string()))
}

fn glass() -> Material {
    Material::dielectric(0.2, 1.5)
}

fn light(x: f64, y: f64, r: f64, intensity: f64) -> SceneEntry {
    SceneEntry::new(Shape::circle(x, y, r), Material::emitter(intensity))
}

fn basic() -> Vec<SceneEntry> {
    vec![light(0.5, 0.5, 0.1, 2.0)]
}

fn fresnel() -> Vec<SceneEntry> {
    vec![
        light(-0.2, -0.2, 0.1, 10.0),
        SceneEntry::new(Shape::rect(0.5, 0.5, 0.0, 0.3, 0.2), glass()),
    ]
}

fn lens() -> Vec<SceneEntry> {
    vec![
        SceneEntry::new(Shape::circle(0.5, 0.2, 0.35), glass()),
        SceneEntry::new(Shape::circle(0.5, 0.8, 0.35), glass()).with_op(CsgOp::Intersect),
        light(0.5, -0.5, 0.05, 20.0),
    ]
}

fn concave() -> Vec<SceneEntry> {
    vec![
        SceneEntry::new(Shape::rect(0.5, 0.5, 0.0, 0.2, 0.1), glass()),
        SceneEntry::new(Shape::circle(0.5, 0.12, 0.35), glass()).with_op(CsgOp::Subtract),
        SceneEntry::new(Shape::circle(0.5, 0.87, 0.35), glass()).with_op(CsgOp::Subtract),
        light(0.5, -0.5, 0.05, 20.0),
    ]
}

fn semicircle() -> Vec<SceneEntry> {
    vec![
        SceneEntry::new(Shape::circle(0.5, 0.5, 0.2), glass()),
        SceneEntry::new(Shape::plane(0.5, 0.5, 0.0, -1.0), glass()).with_op(CsgOp::Intersect),
        light(0.5, -0.5, 0.05, 20.0),
    ]
}

fn beer_lambert() -> Vec<SceneEntry> {
    vec![
        light(-0.2, -0.2, 0.1, 10.0),
        SceneEntry::new(
            Shape::rect(0.5, 0.5, 0.0, 0.3, 0.2),
            glass().with_absorption(Color::repeat(4.0)),
        ),
    ]
}

fn beer_lambert_color() -> Vec<SceneEntry> {
    vec![
        light(0.5, -0.2, 0.1, 10.0),
        SceneEntry::new(
            Shape::ngon(0.5, 0.5, 0.25, 5),
            Material::dielectric(0.0, 1.5).with_absorption(Color::new(4.0, 4.0, 1.0)),
        ),
    ]
}

fn keep_defaults(_: &mut RenderConfig) {}

fn configure_basic(config: &mut RenderConfig) {
    config.samples = 64;
    config.tracer.max_step = 10;
    config.tracer.max_distance = 2.0;
    config.tracer.start_offset = 0.0;
    config.tracer.interior_is_hit = true;
    config.post.zero_green = true;
}

fn configure_beer_lambert_color(config: &mut RenderConfig) {
    config.tracer.max_depth = 5;
}
