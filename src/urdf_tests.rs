use std::{f64::consts::FRAC_PI_2, fs};

use float_cmp::{ApproxEq, F64Margin};
use nalgebra::DVector;

use super::*;
use crate::model_elements::data::frames_forward_kinematics;

const MARGIN: F64Margin = F64Margin {
    epsilon: 1e-9,
    ulps: 4,
};

const ARM: &str = r#"
<robot name="arm">
  <material name="Blue">
    <color rgba="0 0 1 1"/>
  </material>
  <link name="base_link">
    <visual>
      <geometry>
        <box size="0.5 0.4 0.2"/>
      </geometry>
      <material name="Blue"/>
    </visual>
  </link>
  <joint name="shoulder_joint" type="revolute">
    <origin xyz="0 0 0.3" rpy="0 0 0"/>
    <parent link="base_link"/>
    <child link="upper_arm"/>
    <axis xyz="0 1 0"/>
    <limit lower="-1.5" upper="2.5" effort="10" velocity="1"/>
  </joint>
  <link name="upper_arm">
    <visual name="upper_arm_shell">
      <origin xyz="0 0 0.25" rpy="0 0 0"/>
      <geometry>
        <cylinder radius="0.05" length="0.5"/>
      </geometry>
      <material name="Grey">
        <color rgba="0.5 0.5 0.5 1"/>
      </material>
    </visual>
  </link>
  <joint name="tool_joint" type="fixed">
    <origin xyz="0 0 0.5" rpy="0 0 0"/>
    <parent link="upper_arm"/>
    <child link="tool_link"/>
  </joint>
  <link name="tool_link">
    <visual>
      <geometry>
        <sphere radius="0.02"/>
      </geometry>
    </visual>
  </link>
  <joint name="wheel_joint" type="continuous">
    <parent link="base_link"/>
    <child link="wheel_link"/>
  </joint>
  <link name="wheel_link"/>
</robot>
"#;

fn build(root_joint: Option<JointType>) -> Model {
    let robot = parse_urdf_str(ARM).unwrap();
    build_model(&robot, root_joint).unwrap()
}

#[test]
fn when_parsing_a_urdf_should_read_links_joints_and_materials() {
    let robot = parse_urdf_str(ARM).unwrap();

    assert_eq!("arm", robot.name);
    assert_eq!(4, robot.links.len());
    assert_eq!(3, robot.joints.len());
    assert_eq!(1, robot.materials.len());
    assert_eq!("revolute", robot.joints[0].joint_type);
    assert_eq!("upper_arm", robot.joints[0].child.link);
    assert_eq!(
        Some("upper_arm_shell".to_string()),
        robot.links[1].visuals[0].name
    );
}

#[test]
fn when_parsing_invalid_xml_should_error() {
    match parse_urdf_str("<robot name=\"broken\"><link name=\"a\">") {
        Err(Error::XmlParse { .. }) => {}
        other => panic!("Expected an XmlParse error, got {:?}", other),
    }
}

#[test]
fn when_parsing_a_missing_file_should_error() {
    let path = Path::new("/does/not/exist/robot.urdf");
    match parse_urdf_file(path) {
        Err(Error::Io { path: p, .. }) => assert_eq!(path, p.as_path()),
        other => panic!("Expected an Io error, got {:?}", other),
    }
}

#[test]
fn when_building_a_fixed_base_model_should_add_one_joint_per_moving_joint() {
    let model = build(None);

    assert_eq!(3, model.njoints());
    assert_eq!(3, model.nq());
    assert_eq!(2, model.nv());

    let shoulder = model.joint(model.get_joint_id("shoulder_joint").unwrap()).unwrap();
    assert_eq!(JointID::universe(), shoulder.parent());
    assert_eq!(0, shoulder.idx_q());
    assert_eq!(-1.5, model.lower_position_limit()[0]);
    assert_eq!(2.5, model.upper_position_limit()[0]);

    let wheel = model.joint(model.get_joint_id("wheel_joint").unwrap()).unwrap();
    match wheel.joint_type() {
        JointType::RevoluteUnbounded { axis } => assert_eq!(Vector3::x(), axis.into_inner()),
        other => panic!("Expected an unbounded revolute joint, got {:?}", other),
    }
    assert_eq!(&[-1.01, -1.01], &model.lower_position_limit().as_slice()[1..3]);
    assert_eq!(&[1.01, 1.01], &model.upper_position_limit().as_slice()[1..3]);
}

#[test]
fn when_building_a_model_should_add_joint_fixed_joint_and_body_frames() {
    let model = build(None);

    // universe, base_link, shoulder (joint + body), tool (fixed + body), wheel (joint + body)
    assert_eq!(8, model.nframes());

    let base = model.frame(model.get_frame_id("base_link").unwrap()).unwrap();
    assert_eq!(FrameType::Body, base.frame_type());
    assert_eq!(JointID::universe(), base.parent_joint());

    let shoulder_frame = model.get_frame_id("shoulder_joint").unwrap();
    assert_eq!(
        FrameType::Joint,
        model.frame(shoulder_frame).unwrap().frame_type()
    );

    let fixed = model.frame(model.get_frame_id("tool_joint").unwrap()).unwrap();
    let tool = model.frame(model.get_frame_id("tool_link").unwrap()).unwrap();
    let shoulder = model.get_joint_id("shoulder_joint").unwrap();
    assert_eq!(FrameType::FixedJoint, fixed.frame_type());
    assert_eq!(shoulder, fixed.parent_joint());
    assert_eq!(shoulder, tool.parent_joint());
    assert_eq!(FrameType::Body, tool.frame_type());
    assert_eq!(
        Vector3::new(0.0, 0.0, 0.5),
        tool.placement().translation.vector
    );
}

#[test]
fn when_building_a_model_with_a_planar_root_should_put_the_root_joint_first() {
    let model = build(Some(JointType::Planar));

    let root = model.joint(JointID::new(1)).unwrap();
    assert_eq!(ROOT_JOINT_NAME, root.name());
    assert_eq!(JointType::Planar, root.joint_type());
    assert_eq!(4, model.njoints());
    assert_eq!(7, model.nq());
    assert_eq!(5, model.nv());
    assert_eq!(9, model.nframes());

    let base = model.frame(model.get_frame_id("base_link").unwrap()).unwrap();
    assert_eq!(JointID::new(1), base.parent_joint());

    let shoulder = model.joint(model.get_joint_id("shoulder_joint").unwrap()).unwrap();
    assert_eq!(JointID::new(1), shoulder.parent());
    assert_eq!(4, shoulder.idx_q());

    assert_eq!(-f64::MAX, model.lower_position_limit()[0]);
    assert_eq!(1.01, model.upper_position_limit()[3]);
}

#[test]
fn when_computing_the_tool_placement_should_merge_the_fixed_joint() {
    let model = build(None);
    let mut data = model.create_data();
    let q = DVector::from_vec(vec![FRAC_PI_2, 1.0, 0.0]);

    frames_forward_kinematics(&model, &mut data, &q).unwrap();

    // A quarter turn around Y moves the tool from above the shoulder to in front of it.
    let tool = data
        .frame_placement(model.get_frame_id("tool_link").unwrap())
        .unwrap();
    let expected = Vector3::new(0.5, 0.0, 0.3);
    for i in 0..3 {
        assert!(
            expected[i].approx_eq(tool.translation.vector[i], MARGIN),
            "Expected {:?} but got {:?}",
            expected,
            tool.translation.vector
        );
    }
}

#[test]
fn when_a_joint_has_an_unknown_type_should_error() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="a"/>
  <link name="b"/>
  <joint name="ball" type="spherical">
    <parent link="a"/>
    <child link="b"/>
  </joint>
</robot>
"#,
    )
    .unwrap();

    match build_model(&robot, None) {
        Err(Error::InvalidAttribute {
            attribute, value, ..
        }) => {
            assert_eq!("type", attribute);
            assert_eq!("spherical", value);
        }
        other => panic!("Expected an InvalidAttribute error, got {:?}", other),
    }
}

#[test]
fn when_a_joint_has_a_zero_axis_should_error() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="a"/>
  <link name="b"/>
  <joint name="j" type="revolute">
    <parent link="a"/>
    <child link="b"/>
    <axis xyz="0 0 0"/>
  </joint>
</robot>
"#,
    )
    .unwrap();

    match build_model(&robot, None) {
        Err(Error::InvalidAttribute { attribute, .. }) => assert_eq!("axis", attribute),
        other => panic!("Expected an InvalidAttribute error, got {:?}", other),
    }
}

#[test]
fn when_an_origin_is_not_a_number_should_error() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="a"/>
  <link name="b"/>
  <joint name="j" type="fixed">
    <origin xyz="0 zero 0"/>
    <parent link="a"/>
    <child link="b"/>
  </joint>
</robot>
"#,
    )
    .unwrap();

    match build_model(&robot, None) {
        Err(Error::InvalidAttribute {
            attribute, value, ..
        }) => {
            assert_eq!("xyz", attribute);
            assert_eq!("zero", value);
        }
        other => panic!("Expected an InvalidAttribute error, got {:?}", other),
    }
}

#[test]
fn when_the_links_have_two_roots_should_error() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="a"/>
  <link name="b"/>
</robot>
"#,
    )
    .unwrap();

    match build_model(&robot, None) {
        Err(Error::InvalidDescription { .. }) => {}
        other => panic!("Expected an InvalidDescription error, got {:?}", other),
    }
}

#[test]
fn when_a_link_has_two_parents_should_error() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="a"/>
  <link name="b"/>
  <link name="c"/>
  <joint name="j1" type="fixed">
    <parent link="a"/>
    <child link="c"/>
  </joint>
  <joint name="j2" type="fixed">
    <parent link="b"/>
    <child link="c"/>
  </joint>
</robot>
"#,
    )
    .unwrap();

    match build_model(&robot, None) {
        Err(Error::InvalidDescription { reason }) => assert!(reason.contains("c")),
        other => panic!("Expected an InvalidDescription error, got {:?}", other),
    }
}

#[test]
fn when_a_joint_refers_to_an_unknown_link_should_error() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="base"/>
  <link name="arm"/>
  <joint name="j" type="revolute">
    <parent link="ghost"/>
    <child link="arm"/>
    <limit lower="-1" upper="1"/>
  </joint>
</robot>
"#,
    )
    .unwrap();

    match build_model(&robot, None) {
        Err(Error::InvalidDescription { reason }) => assert!(reason.contains("ghost")),
        other => panic!("Expected an InvalidDescription error, got {:?}", other),
    }
}

#[test]
fn when_links_are_not_connected_to_the_root_should_error() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="base"/>
  <link name="b"/>
  <link name="c"/>
  <joint name="b_to_c" type="fixed">
    <parent link="b"/>
    <child link="c"/>
  </joint>
  <joint name="c_to_b" type="fixed">
    <parent link="c"/>
    <child link="b"/>
  </joint>
</robot>
"#,
    )
    .unwrap();

    match build_model(&robot, None) {
        Err(Error::InvalidDescription { reason }) => {
            assert!(reason.contains("\"b\""));
            assert!(reason.contains("\"c\""));
        }
        other => panic!("Expected an InvalidDescription error, got {:?}", other),
    }
}

#[test]
fn when_visuals_share_a_name_should_name_the_geometry_after_the_link() {
    let robot = parse_urdf_str(
        r#"
<robot name="r">
  <link name="left">
    <visual name="v">
      <geometry>
        <sphere radius="0.1"/>
      </geometry>
    </visual>
  </link>
  <joint name="j" type="fixed">
    <parent link="left"/>
    <child link="right"/>
  </joint>
  <link name="right">
    <visual name="v">
      <geometry>
        <sphere radius="0.1"/>
      </geometry>
    </visual>
    <visual name="v">
      <geometry>
        <sphere radius="0.2"/>
      </geometry>
    </visual>
  </link>
</robot>
"#,
    )
    .unwrap();
    let model = build_model(&robot, None).unwrap();

    let geometry_model = build_geometry_model(&robot, &model, &[], None).unwrap();

    let names: Vec<&str> = geometry_model.geometry_objects().map(|g| g.name()).collect();
    assert_eq!(vec!["left_0", "right_0", "right_1"], names);
}

#[test]
fn when_building_the_geometry_should_add_one_object_per_visual() {
    let robot = parse_urdf_str(ARM).unwrap();
    let model = build_model(&robot, None).unwrap();

    let geometry_model = build_geometry_model(&robot, &model, &[], None).unwrap();

    assert_eq!(3, geometry_model.ngeoms());
    let names: Vec<&str> = geometry_model.geometry_objects().map(|g| g.name()).collect();
    assert_eq!(vec!["base_link_0", "upper_arm_0", "tool_link_0"], names);

    let base = geometry_model.geometry_object(0).unwrap();
    assert_eq!(
        &GeometryShape::Box {
            size: Vector3::new(0.5, 0.4, 0.2)
        },
        base.shape()
    );
    // The named material is declared at the robot level.
    assert_eq!(&Vector4::new(0.0, 0.0, 1.0, 1.0), base.mesh_color());

    let shell = geometry_model.geometry_object(1).unwrap();
    assert_eq!(&Vector4::new(0.5, 0.5, 0.5, 1.0), shell.mesh_color());
    assert_eq!(
        model.get_joint_id("shoulder_joint").unwrap(),
        shell.parent_joint()
    );

    // The tool sphere hangs off the fixed joint, so its placement includes the fixed offset.
    let tool = geometry_model.geometry_object(2).unwrap();
    assert_eq!(
        Vector3::new(0.0, 0.0, 0.5),
        tool.placement().translation.vector
    );
    assert_eq!(
        model.get_frame_id("tool_link").unwrap(),
        tool.parent_frame()
    );
    assert_eq!(
        &Vector4::from(crate::geometry::geometry_elements::DEFAULT_MESH_COLOR),
        tool.mesh_color()
    );
}

#[test]
fn when_resolving_a_package_mesh_should_search_the_package_directories() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let meshes = second.path().join("pkg").join("meshes");
    fs::create_dir_all(&meshes).unwrap();
    fs::write(meshes.join("part.stl"), "solid part\nendsolid part\n").unwrap();

    let package_dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let path = resolve_mesh_path("package://pkg/meshes/part.stl", &package_dirs, None).unwrap();

    assert_eq!(meshes.join("part.stl"), path);
}

#[test]
fn when_resolving_a_relative_mesh_should_use_the_description_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("part.stl"), "solid part\nendsolid part\n").unwrap();

    let path = resolve_mesh_path("part.stl", &[], Some(dir.path())).unwrap();
    assert_eq!(dir.path().join("part.stl"), path);

    let absolute = format!("file://{}", dir.path().join("part.stl").display());
    assert_eq!(
        dir.path().join("part.stl"),
        resolve_mesh_path(&absolute, &[], None).unwrap()
    );
}

#[test]
fn when_a_mesh_cannot_be_found_should_error() {
    let dir = tempfile::tempdir().unwrap();

    assert_eq!(
        Err(Error::MeshNotFound {
            filename: "package://pkg/meshes/missing.stl".to_string()
        }),
        resolve_mesh_path(
            "package://pkg/meshes/missing.stl",
            &[dir.path().to_path_buf()],
            None
        )
    );
}

#[test]
fn when_reading_the_tiago_description_should_find_the_marker_anchors() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("tiago_description")
        .join("robots")
        .join("tiago_no_hand.urdf");
    let robot = parse_urdf_file(&path).unwrap();
    let model = build_model(&robot, Some(JointType::Planar)).unwrap();

    for anchor in ["wrist_ft_tool_link", "base_link", "xtion_joint"] {
        assert!(model.exists_frame(anchor), "Missing frame {}", anchor);
    }

    let xtion = model.frame(model.get_frame_id("xtion_joint").unwrap()).unwrap();
    assert_eq!(FrameType::FixedJoint, xtion.frame_type());
    assert_eq!(
        model.get_joint_id("head_2_joint").unwrap(),
        xtion.parent_joint()
    );
}
