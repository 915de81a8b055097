mod core;

pub use self::core::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_clone_and_equality() {
        let r = Rect {
            x: 10.0,
            y: 20.0,
            width: 800.0,
            height: 600.0,
        };
        let r2 = r;
        assert_eq!(r, r2);
    }

    #[test]
    fn rect_serialization() {
        let r = Rect {
            x: 0.0,
            y: 0.0,
            width: 1920.0,
            height: 1080.0,
        };
        let json = serde_json::to_string(&r).unwrap();
        let deserialized: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(r, deserialized);
    }

    #[test]
    fn to_pixel_floors_position_and_ceils_size() {
        let r = Rect {
            x: 10.6,
            y: 10.4,
            width: 500.5,
            height: 400.9,
        };
        let px = r.to_pixel().unwrap();
        assert_eq!(
            px,
            PixelRect {
                x: 10,
                y: 10,
                width: 501,
                height: 401,
            }
        );
    }

    #[test]
    fn to_pixel_exact_values_unchanged() {
        let r = Rect {
            x: -5.0,
            y: 0.0,
            width: 640.0,
            height: 480.0,
        };
        let px = r.to_pixel().unwrap();
        assert_eq!(px.x, -5);
        assert_eq!(px.width, 640);
        assert_eq!(px.height, 480);
    }

    #[test]
    fn to_pixel_rejects_negative_extent() {
        let r = Rect {
            x: 0.0,
            y: 0.0,
            width: -1.0,
            height: 100.0,
        };
        assert!(r.to_pixel().is_none());
    }

    #[test]
    fn to_pixel_rejects_non_finite() {
        let r = Rect {
            x: f64::NAN,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(r.to_pixel().is_none());

        let r = Rect {
            x: 0.0,
            y: 0.0,
            width: f64::INFINITY,
            height: 10.0,
        };
        assert!(r.to_pixel().is_none());
    }

    #[test]
    fn window_id_display() {
        let id = WindowId(42);
        assert_eq!(id.to_string(), "window-42");
    }

    #[test]
    fn tab_id_display() {
        let id = TabId(7);
        assert_eq!(id.to_string(), "tab-7");
    }

    #[test]
    fn window_id_hash_and_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(WindowId(1));
        set.insert(WindowId(2));
        set.insert(WindowId(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn window_kind_serialization() {
        let json = serde_json::to_string(&WindowKind::Browser).unwrap();
        assert_eq!(json, "\"browser\"");
        let deserialized: WindowKind = serde_json::from_str("\"notes\"").unwrap();
        assert_eq!(deserialized, WindowKind::Notes);
    }
}
