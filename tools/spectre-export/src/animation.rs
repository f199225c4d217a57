//! Animation channel encoding
//!
//! Clips are transcribed as-is: no resampling, no interpolation and no
//! track-length checks. Position, rotation and scale tracks are timed
//! independently; consumers interpolate at playback time.

use spectre_common::{Animation, AnimationRecord, ChannelRecord, NodeAnimation, Scene};

/// Encode every animation of a scene, in scene order
pub fn encode_animations(animations: &[Animation]) -> Vec<AnimationRecord> {
    animations.iter().map(encode_animation).collect()
}

/// Encode one clip; channels keep their declared order
pub fn encode_animation(animation: &Animation) -> AnimationRecord {
    let channels: Vec<ChannelRecord> = animation.channels.iter().map(encode_channel).collect();

    tracing::debug!(
        "Animation '{}': {} channels, {} ticks @ {} ticks/s",
        animation.name,
        channels.len(),
        animation.duration,
        animation.ticks_per_second
    );

    AnimationRecord {
        name: animation.name.clone(),
        ticks_per_second: animation.ticks_per_second,
        duration_ticks: animation.duration,
        channels,
    }
}

fn encode_channel(channel: &NodeAnimation) -> ChannelRecord {
    ChannelRecord {
        node_name: channel.node_name.clone(),
        position_track: channel.position_keys.clone(),
        rotation_track: channel.rotation_keys.clone(),
        scale_track: channel.scaling_keys.clone(),
    }
}

/// Duration of a clip in seconds, `None` when the tick rate is unknown
pub fn duration_seconds(animation: &Animation) -> Option<f64> {
    (animation.ticks_per_second > 0.0).then(|| animation.duration / animation.ticks_per_second)
}

/// Log the animations of a scene
pub fn list_animations(scene: &Scene) {
    if scene.animations.is_empty() {
        tracing::info!("No animations found");
        return;
    }

    tracing::info!("Animations:");
    for (i, anim) in scene.animations.iter().enumerate() {
        match duration_seconds(anim) {
            Some(seconds) => tracing::info!(
                "  [{}] '{}': {} channels, {:.2}s",
                i,
                anim.name,
                anim.channels.len(),
                seconds
            ),
            None => tracing::info!(
                "  [{}] '{}': {} channels, {} ticks",
                i,
                anim.name,
                anim.channels.len(),
                anim.duration
            ),
        }
    }
}
