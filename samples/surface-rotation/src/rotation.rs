//! Surface rotation policy and detection.
//!
//! Pure decision logic for pre-rotation handling:
//! - which pre-transform to declare to the presentation engine,
//! - when a rotation-only surface change requires swapchain recreation,
//! - how the active transform maps to a camera rotation matrix.

use ash::vk;
use glam::{Mat4, Vec3};

use vks_rhi::surface::SurfaceProperties;

/// Selects the swapchain pre-transform for the current rotation policy.
///
/// When the application handles rotation, the surface's current transform
/// is returned verbatim: the swapchain declares that its content is already
/// oriented for the display, and the presentation engine skips its own
/// rotation pass. Otherwise IDENTITY is returned and the compositor rotates
/// at presentation time.
pub fn select_pre_transform(
    application_rotates: bool,
    properties: &SurfaceProperties,
) -> vk::SurfaceTransformFlagsKHR {
    if application_rotates {
        properties.current_transform
    } else {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    }
}

/// Detects a rotation-only surface change that requires recreation.
///
/// Some platforms rotate the surface without delivering a resize event, so
/// the transform has to be polled. Returns true only when the freshly
/// queried extent still equals the render context's extent (an in-flight
/// resize is handled by the ordinary resize path and takes precedence), the
/// application handles rotation, and the queried transform differs from the
/// swapchain's. Compositor-handled rotation never changes what the
/// application sees, so it never triggers this path.
pub fn needs_recreate(
    last_extent: vk::Extent2D,
    last_transform: vk::SurfaceTransformFlagsKHR,
    properties: &SurfaceProperties,
    application_rotates: bool,
) -> bool {
    properties.current_extent.width == last_extent.width
        && properties.current_extent.height == last_extent.height
        && application_rotates
        && properties.current_transform != last_transform
}

/// Maps the active swapchain transform to the camera pre-rotation matrix.
///
/// The rotation is about the view-forward axis (0, 0, -1). Transforms
/// without a plain rotate bit (identity, mirrors, inherit, anything
/// unknown) contribute no rotation.
pub fn rotation_matrix(transform: vk::SurfaceTransformFlagsKHR) -> Mat4 {
    let axis = Vec3::new(0.0, 0.0, -1.0);
    match transform {
        vk::SurfaceTransformFlagsKHR::ROTATE_90 => {
            Mat4::from_axis_angle(axis, 90.0_f32.to_radians())
        }
        vk::SurfaceTransformFlagsKHR::ROTATE_180 => {
            Mat4::from_axis_angle(axis, 180.0_f32.to_radians())
        }
        vk::SurfaceTransformFlagsKHR::ROTATE_270 => {
            Mat4::from_axis_angle(axis, 270.0_f32.to_radians())
        }
        _ => Mat4::IDENTITY,
    }
}

/// Human-readable name for a surface transform, for the overlay.
pub fn transform_name(transform: vk::SurfaceTransformFlagsKHR) -> &'static str {
    match transform {
        vk::SurfaceTransformFlagsKHR::IDENTITY => "SURFACE_TRANSFORM_IDENTITY",
        vk::SurfaceTransformFlagsKHR::ROTATE_90 => "SURFACE_TRANSFORM_ROTATE_90",
        vk::SurfaceTransformFlagsKHR::ROTATE_180 => "SURFACE_TRANSFORM_ROTATE_180",
        vk::SurfaceTransformFlagsKHR::ROTATE_270 => "SURFACE_TRANSFORM_ROTATE_270",
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR => "SURFACE_TRANSFORM_HORIZONTAL_MIRROR",
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_90 => {
            "SURFACE_TRANSFORM_HORIZONTAL_MIRROR_ROTATE_90"
        }
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_180 => {
            "SURFACE_TRANSFORM_HORIZONTAL_MIRROR_ROTATE_180"
        }
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_270 => {
            "SURFACE_TRANSFORM_HORIZONTAL_MIRROR_ROTATE_270"
        }
        vk::SurfaceTransformFlagsKHR::INHERIT => "SURFACE_TRANSFORM_INHERIT",
        _ => "[unknown transform]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TRANSFORMS: [vk::SurfaceTransformFlagsKHR; 9] = [
        vk::SurfaceTransformFlagsKHR::IDENTITY,
        vk::SurfaceTransformFlagsKHR::ROTATE_90,
        vk::SurfaceTransformFlagsKHR::ROTATE_180,
        vk::SurfaceTransformFlagsKHR::ROTATE_270,
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR,
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_90,
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_180,
        vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR_ROTATE_270,
        vk::SurfaceTransformFlagsKHR::INHERIT,
    ];

    fn properties(
        width: u32,
        height: u32,
        current_transform: vk::SurfaceTransformFlagsKHR,
    ) -> SurfaceProperties {
        SurfaceProperties {
            current_extent: vk::Extent2D { width, height },
            current_transform,
            supported_transforms: ALL_TRANSFORMS
                .iter()
                .fold(vk::SurfaceTransformFlagsKHR::empty(), |acc, &t| acc | t),
        }
    }

    #[test]
    fn application_policy_returns_current_transform_verbatim() {
        for &transform in &ALL_TRANSFORMS {
            let props = properties(800, 600, transform);
            assert_eq!(select_pre_transform(true, &props), transform);
        }
    }

    #[test]
    fn compositor_policy_always_returns_identity() {
        for &transform in &ALL_TRANSFORMS {
            let props = properties(800, 600, transform);
            assert_eq!(
                select_pre_transform(false, &props),
                vk::SurfaceTransformFlagsKHR::IDENTITY
            );
        }
    }

    #[test]
    fn extent_mismatch_short_circuits_for_any_transforms() {
        let last_extent = vk::Extent2D {
            width: 800,
            height: 600,
        };
        for &last in &ALL_TRANSFORMS {
            for &current in &ALL_TRANSFORMS {
                let props = properties(600, 800, current);
                assert!(!needs_recreate(last_extent, last, &props, true));
                assert!(!needs_recreate(last_extent, last, &props, false));
            }
        }
    }

    #[test]
    fn rotation_only_change_triggers_recreate() {
        let last_extent = vk::Extent2D {
            width: 1080,
            height: 1920,
        };
        let props = properties(1080, 1920, vk::SurfaceTransformFlagsKHR::ROTATE_90);

        assert!(needs_recreate(
            last_extent,
            vk::SurfaceTransformFlagsKHR::IDENTITY,
            &props,
            true,
        ));
    }

    #[test]
    fn unchanged_transform_does_not_trigger_recreate() {
        let last_extent = vk::Extent2D {
            width: 1080,
            height: 1920,
        };
        let props = properties(1080, 1920, vk::SurfaceTransformFlagsKHR::ROTATE_90);

        assert!(!needs_recreate(
            last_extent,
            vk::SurfaceTransformFlagsKHR::ROTATE_90,
            &props,
            true,
        ));
    }

    // Scenario A: compositor-handled, extent unchanged, the surface rotates
    // underneath. Nothing recreates and the selected transform stays
    // identity.
    #[test]
    fn compositor_handled_rotation_is_ignored() {
        let last_extent = vk::Extent2D {
            width: 1080,
            height: 1920,
        };
        let props = properties(1080, 1920, vk::SurfaceTransformFlagsKHR::ROTATE_90);

        assert!(!needs_recreate(
            last_extent,
            vk::SurfaceTransformFlagsKHR::IDENTITY,
            &props,
            false,
        ));
        assert_eq!(
            select_pre_transform(false, &props),
            vk::SurfaceTransformFlagsKHR::IDENTITY
        );
    }

    // Scenario B: application-handled, extent unchanged, identity becomes
    // rotate-90. Recreation fires with ROTATE_90 and the camera picks up a
    // 90 degree rotation about the view-forward axis.
    #[test]
    fn application_handled_rotation_recreates_with_the_new_transform() {
        let last_extent = vk::Extent2D {
            width: 1080,
            height: 1920,
        };
        let props = properties(1080, 1920, vk::SurfaceTransformFlagsKHR::ROTATE_90);

        assert!(needs_recreate(
            last_extent,
            vk::SurfaceTransformFlagsKHR::IDENTITY,
            &props,
            true,
        ));
        assert_eq!(
            select_pre_transform(true, &props),
            vk::SurfaceTransformFlagsKHR::ROTATE_90
        );

        let expected = Mat4::from_axis_angle(Vec3::new(0.0, 0.0, -1.0), 90.0_f32.to_radians());
        let actual = rotation_matrix(vk::SurfaceTransformFlagsKHR::ROTATE_90);
        for (a, b) in actual
            .to_cols_array()
            .iter()
            .zip(expected.to_cols_array().iter())
        {
            assert!((a - b).abs() < 1e-6);
        }
    }

    // Scenario C: the policy is toggled to application-handled while the
    // surface is already rotated 180 degrees. The transform selected for
    // the recreation is ROTATE_180.
    #[test]
    fn policy_toggle_selects_the_already_active_transform() {
        let props = properties(1920, 1080, vk::SurfaceTransformFlagsKHR::ROTATE_180);
        assert_eq!(
            select_pre_transform(true, &props),
            vk::SurfaceTransformFlagsKHR::ROTATE_180
        );
    }

    #[test]
    fn only_plain_rotate_bits_produce_a_rotation() {
        for &transform in &ALL_TRANSFORMS {
            let matrix = rotation_matrix(transform);
            let rotates = matches!(
                transform,
                vk::SurfaceTransformFlagsKHR::ROTATE_90
                    | vk::SurfaceTransformFlagsKHR::ROTATE_180
                    | vk::SurfaceTransformFlagsKHR::ROTATE_270
            );
            assert_eq!(matrix == Mat4::IDENTITY, !rotates, "{:?}", transform);
        }
    }

    #[test]
    fn unknown_transform_bits_contribute_no_rotation() {
        let unknown = vk::SurfaceTransformFlagsKHR::from_raw(1 << 20);
        assert_eq!(rotation_matrix(unknown), Mat4::IDENTITY);
        assert_eq!(transform_name(unknown), "[unknown transform]");
    }

    #[test]
    fn every_known_transform_has_a_name() {
        for &transform in &ALL_TRANSFORMS {
            assert!(!transform_name(transform).starts_with('['), "{:?}", transform);
        }
    }
}
