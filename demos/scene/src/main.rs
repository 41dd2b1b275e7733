use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use futures::executor::block_on;
use umbra::{
    RenderableInstance, RendererConfig, Scene, SceneConfiguration, ShadowSettings,
    TransformPolicy, cgmath::Vector3, resources, resources::primitives,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Shading {
    Solid,
    Directional,
    Point,
}

impl From<Shading> for SceneConfiguration {
    fn from(shading: Shading) -> Self {
        match shading {
            Shading::Solid => SceneConfiguration::SolidShading,
            Shading::Directional => SceneConfiguration::DirectionalLight,
            Shading::Point => SceneConfiguration::PointLight,
        }
    }
}

/// Shadow-mapping demo: a ground plane, a cube, a sphere and optional OBJ
/// meshes lit by a single light.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// OBJ mesh placed at the origin, spins and scales with Q/E and O/P.
    #[arg(long)]
    teapot: Option<PathBuf>,

    /// OBJ mesh placed behind the sphere.
    #[arg(long)]
    monkey: Option<PathBuf>,

    /// Diffuse texture for every object, a checkerboard when omitted.
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Directory with shader overrides, reloaded with R.
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Width and height of the shadow map in texels.
    #[arg(long, default_value_t = 1024)]
    shadow_resolution: u32,

    #[arg(long, value_enum, default_value_t = Shading::Directional)]
    shading: Shading,

    /// env_logger filter, e.g. `umbra=debug`.
    #[arg(long)]
    log: Option<String>,

    /// Start without the camera fly-out.
    #[arg(long)]
    no_intro: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = RendererConfig::new()
        .shadow(ShadowSettings::default().resolution(args.shadow_resolution))
        .initial_configuration(args.shading.into());
    if let Some(dir) = args.shader_dir {
        config = config.shader_dir(dir);
    }
    if let Some(filter) = args.log {
        config = config.log_filter(filter);
    }
    if args.no_intro {
        config.animation.intro_seconds = 0.0;
    }
    umbra::flow::init_logging(config.log_filter.as_deref());

    // Meshes are parsed before the window opens and uploaded once the device exists.
    let teapot = args
        .teapot
        .as_deref()
        .map(|path| block_on(resources::load_mesh(path)))
        .transpose()?;
    let monkey = args
        .monkey
        .as_deref()
        .map(|path| block_on(resources::load_mesh(path)))
        .transpose()?;
    let texture = args.texture;

    umbra::flow::run(config, move |device| {
        let diffuse = match &texture {
            Some(path) => resources::load_texture(&mut *device, path)?,
            None => device.create_texture(&primitives::checker(512, 8), "checker"),
        };

        let ground = device.create_geometry(&primitives::ground());
        let cube = device.create_geometry(&primitives::cube(0.5));
        let sphere = device.create_geometry(&primitives::sphere(0.75, 24, 32));

        let mut scene = Scene::new()
            .with(
                RenderableInstance::new("ground", ground, diffuse, Vector3::new(0.0, 0.0, 0.0))
                    .with_policy(TransformPolicy::Fixed)
                    .with_shadow(false),
            )
            .with(RenderableInstance::new(
                "cube",
                cube,
                diffuse,
                Vector3::new(3.0, 1.0, 0.0),
            ))
            .with(RenderableInstance::new(
                "sphere",
                sphere,
                diffuse,
                Vector3::new(-3.0, 1.0, 2.0),
            ));

        if let Some(mesh) = &teapot {
            let geometry = device.create_geometry(mesh);
            scene.push(
                RenderableInstance::new("teapot", geometry, diffuse, Vector3::new(0.0, 1.0, 0.0))
                    .with_policy(TransformPolicy::SpinScaled),
            );
        }
        if let Some(mesh) = &monkey {
            let geometry = device.create_geometry(mesh);
            scene.push(RenderableInstance::new(
                "monkey",
                geometry,
                diffuse,
                Vector3::new(-3.0, 1.0, -2.0),
            ));
        }

        log::info!("Demo scene: {} objects", scene.len());
        Ok(scene)
    })
}
