use std::rc::Rc;

use glam::Mat4;
use sdl2::keyboard::Keycode;

pub mod loader;
pub mod mesh;
pub mod primitives;

/// Anything that can render itself given the camera matrices and the
/// accumulated model transform of its parents.
pub trait Drawable {
    fn draw(&self, projection: &Mat4, view: &Mat4, model: &Mat4);

    /// Drawables reacting to key presses return themselves here.
    fn key_handler(&self) -> Option<&dyn KeyHandler> {
        None
    }
}

pub trait KeyHandler {
    fn handle_key(&self, key: Keycode);
}

/// A transform hierarchy element. Children are shared handles, so the same
/// drawable or sub-tree can be placed under several parents without
/// duplicating any GPU resource.
pub struct Node {
    transform: Mat4,
    drawables: Vec<Rc<dyn Drawable>>,
    nodes: Vec<Rc<Node>>,
}

impl Node {
    pub fn new(transform: Mat4) -> Node {
        Node {
            transform,
            drawables: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn with_drawable(mut self, drawable: Rc<dyn Drawable>) -> Node {
        self.drawables.push(drawable);
        self
    }

    pub fn with_drawables(mut self, drawables: impl IntoIterator<Item = Rc<dyn Drawable>>) -> Node {
        self.drawables.extend(drawables);
        self
    }

    pub fn with_node(mut self, node: Rc<Node>) -> Node {
        self.nodes.push(node);
        self
    }

    /// Visits every drawable of this sub-tree depth-first in insertion order,
    /// passing along `parent · local` of the node holding it.
    pub fn traverse(&self, parent: &Mat4, visit: &mut dyn FnMut(&Mat4, &dyn Drawable)) {
        let world = *parent * self.transform;
        for drawable in &self.drawables {
            visit(&world, drawable.as_ref());
        }
        for node in &self.nodes {
            node.traverse(&world, visit);
        }
    }
}

impl Drawable for Node {
    fn draw(&self, projection: &Mat4, view: &Mat4, model: &Mat4) {
        self.traverse(model, &mut |world, drawable| {
            drawable.draw(projection, view, world)
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Vec3;
    use std::cell::RefCell;

    /// Remembers every model transform it was drawn with.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) models: RefCell<Vec<Mat4>>,
    }

    impl Drawable for Recorder {
        fn draw(&self, _projection: &Mat4, _view: &Mat4, model: &Mat4) {
            self.models.borrow_mut().push(*model);
        }
    }

    /// Appends its tag to a shared log, to observe draw order.
    struct Tagged(&'static str, Rc<RefCell<Vec<&'static str>>>);

    impl Drawable for Tagged {
        fn draw(&self, _projection: &Mat4, _view: &Mat4, _model: &Mat4) {
            self.1.borrow_mut().push(self.0);
        }
    }

    fn approx_eq(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn identity_root_passes_identity_model() {
        let triangle = Rc::new(Recorder::default());
        let root = Node::new(Mat4::IDENTITY).with_drawable(triangle.clone());
        root.draw(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY);
        assert_eq!(*triangle.models.borrow(), [Mat4::IDENTITY]);
    }

    #[test]
    fn nested_transforms_compose_parent_first() {
        let scale2 = Mat4::from_scale(Vec3::splat(2.0));
        let up = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let half = Mat4::from_scale(Vec3::splat(0.5));

        let leaf = Rc::new(Recorder::default());
        let c = Node::new(half).with_drawable(leaf.clone());
        let b = Node::new(up).with_node(Rc::new(c));
        let a = Node::new(scale2).with_node(Rc::new(b));
        a.draw(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY);

        let models = leaf.models.borrow();
        assert_eq!(models.len(), 1);
        assert!(approx_eq(models[0], scale2 * up * half));
        // The translation is scaled by the outer node only.
        let origin = models[0].transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn scale_rotate_translate_order_is_not_commutative() {
        let scale = Mat4::from_scale(Vec3::new(1.0, 3.0, 1.0));
        let rotate = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let translate = Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0));

        let leaf = Rc::new(Recorder::default());
        let inner = Node::new(translate).with_drawable(leaf.clone());
        let middle = Node::new(rotate).with_node(Rc::new(inner));
        let outer = Node::new(scale).with_node(Rc::new(middle));
        outer.draw(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY);

        let world = leaf.models.borrow()[0];
        assert!(approx_eq(world, scale * rotate * translate));
        assert!(!approx_eq(world, translate * rotate * scale));
    }

    #[test]
    fn every_level_is_parent_world_times_local() {
        let transforms = [
            Mat4::from_rotation_y(0.3),
            Mat4::from_translation(Vec3::new(1.0, -2.0, 0.5)),
            Mat4::from_scale(Vec3::new(0.5, 2.0, 1.0)),
            Mat4::from_rotation_x(1.1),
        ];
        let recorders: Vec<Rc<Recorder>> =
            transforms.iter().map(|_| Rc::new(Recorder::default())).collect();

        let mut node: Option<Node> = None;
        for (transform, recorder) in transforms.iter().zip(&recorders).rev() {
            let mut parent = Node::new(*transform).with_drawable(recorder.clone());
            if let Some(child) = node.take() {
                parent = parent.with_node(Rc::new(child));
            }
            node = Some(parent);
        }
        let root = node.unwrap();
        let parent_model = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
        root.draw(&Mat4::IDENTITY, &Mat4::IDENTITY, &parent_model);

        let mut expected = parent_model;
        for (transform, recorder) in transforms.iter().zip(&recorders) {
            expected *= *transform;
            assert!(approx_eq(recorder.models.borrow()[0], expected));
        }
    }

    #[test]
    fn shared_drawable_is_drawn_once_per_parent() {
        let cylinder = Rc::new(Recorder::default());
        let left = Node::new(Mat4::from_translation(Vec3::X)).with_drawable(cylinder.clone());
        let right = Node::new(Mat4::from_translation(-Vec3::X)).with_drawable(cylinder.clone());
        let root = Node::new(Mat4::IDENTITY)
            .with_node(Rc::new(left))
            .with_node(Rc::new(right));
        root.draw(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY);

        let models = cylinder.models.borrow();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].w_axis.x, 1.0);
        assert_eq!(models[1].w_axis.x, -1.0);
    }

    #[test]
    fn siblings_draw_in_insertion_order_depth_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let tag = |name| Rc::new(Tagged(name, log.clone())) as Rc<dyn Drawable>;
        let child = Node::new(Mat4::IDENTITY)
            .with_drawable(tag("child-a"))
            .with_drawable(tag("child-b"));
        let root = Node::new(Mat4::IDENTITY)
            .with_drawable(tag("first"))
            .with_drawable(tag("second"))
            .with_node(Rc::new(child));
        root.draw(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY);
        assert_eq!(*log.borrow(), ["first", "second", "child-a", "child-b"]);
    }

    #[test]
    fn empty_node_draws_nothing() {
        let node = Node::new(Mat4::from_scale(Vec3::splat(3.0)));
        let mut visited = 0;
        node.traverse(&Mat4::IDENTITY, &mut |_, _| visited += 1);
        assert_eq!(visited, 0);
    }
}
