use std::collections::{HashMap, VecDeque};

use netsync::{
    BitReader, BitWriter, EntityPath, FieldName, FunctionName, HostEntity, HostWorld, Serde,
};

use crate::helpers::test_value::TestValue;

struct TestEntity {
    path: EntityPath,
    fields: HashMap<FieldName, TestValue>,
    alive: bool,
    /// Axis values handed out by `collect_input`, one per captured input.
    scripted_inputs: VecDeque<f32>,
}

/// A scriptable host world. Entities are flat field maps; the supported
/// process functions and the input model are tiny but deterministic, so a
/// server world and a client world fed the same inputs stay bit-identical.
///
/// Process functions:
/// - `"sink"`: `pos.z -= delta` (server-style gravity)
/// Input model: one `f32` axis; `apply_input` moves `pos.x` by `axis * delta`.
pub struct TestWorld {
    entities: HashMap<HostEntity, TestEntity>,
    iterations_per_second: f32,
    /// Every `emit_change` call, for assertions.
    pub emitted_changes: Vec<(HostEntity, FieldName)>,
    /// Every process-function invocation, for assertions.
    pub process_calls: usize,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            iterations_per_second: 60.0,
            emitted_changes: Vec::new(),
            process_calls: 0,
        }
    }

    pub fn spawn(&mut self, id: u64, path: &str) -> HostEntity {
        let entity = HostEntity(id);
        self.entities.insert(
            entity,
            TestEntity {
                path: path.to_string(),
                fields: HashMap::new(),
                alive: true,
                scripted_inputs: VecDeque::new(),
            },
        );
        entity
    }

    pub fn kill(&mut self, entity: HostEntity) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.alive = false;
        }
    }

    pub fn set(&mut self, entity: HostEntity, field: &str, value: TestValue) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.fields.insert(field.to_string(), value);
        }
    }

    pub fn get(&self, entity: HostEntity, field: &str) -> Option<&TestValue> {
        self.entities.get(&entity)?.fields.get(field)
    }

    pub fn pos(&self, entity: HostEntity) -> (f32, f32, f32) {
        self.get(entity, "pos")
            .and_then(TestValue::as_vec3)
            .unwrap_or((0.0, 0.0, 0.0))
    }

    /// Queue one axis input for the next capture on `entity`.
    pub fn push_input(&mut self, entity: HostEntity, axis: f32) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.scripted_inputs.push_back(axis);
        }
    }

    pub fn changes_for(&self, entity: HostEntity, field: &str) -> usize {
        self.emitted_changes
            .iter()
            .filter(|(changed_entity, name)| *changed_entity == entity && name == field)
            .count()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl HostWorld for TestWorld {
    type Value = TestValue;

    fn entity_exists(&self, entity: HostEntity) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|record| record.alive)
    }

    fn entity_path(&self, entity: HostEntity) -> Option<EntityPath> {
        self.entities.get(&entity).map(|record| record.path.clone())
    }

    fn resolve_path(&self, path: &EntityPath) -> Option<HostEntity> {
        self.entities
            .iter()
            .find(|(_, record)| record.alive && record.path == *path)
            .map(|(entity, _)| *entity)
    }

    fn get_field(&self, entity: HostEntity, field: &FieldName) -> Option<TestValue> {
        self.entities.get(&entity)?.fields.get(field).cloned()
    }

    fn set_field(&mut self, entity: HostEntity, field: &FieldName, value: TestValue) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.fields.insert(field.clone(), value);
        }
    }

    fn emit_change(&mut self, entity: HostEntity, field: &FieldName) {
        self.emitted_changes.push((entity, field.clone()));
    }

    fn process(&mut self, entity: HostEntity, function: &FunctionName, delta: f32) {
        self.process_calls += 1;

        if function == "sink" {
            if let Some(record) = self.entities.get_mut(&entity) {
                if let Some(TestValue::Vec3(x, y, z)) = record.fields.get("pos").cloned() {
                    record
                        .fields
                        .insert("pos".to_string(), TestValue::Vec3(x, y, z - delta));
                }
            }
        }
    }

    fn collect_input(&mut self, controller: HostEntity, _delta: f32, writer: &mut BitWriter) {
        let axis = self
            .entities
            .get_mut(&controller)
            .and_then(|record| record.scripted_inputs.pop_front())
            .unwrap_or(0.0);
        axis.ser(writer);
    }

    fn apply_input(&mut self, controller: HostEntity, delta: f32, input: &mut BitReader) {
        // a ghost input arrives as an empty reader and moves nothing
        let axis = f32::de(input).unwrap_or(0.0);

        if let Some(record) = self.entities.get_mut(&controller) {
            if let Some(TestValue::Vec3(x, y, z)) = record.fields.get("pos").cloned() {
                record
                    .fields
                    .insert("pos".to_string(), TestValue::Vec3(x + axis * delta, y, z));
            }
        }
    }

    fn collect_epoch_state(&mut self, controller: HostEntity, writer: &mut BitWriter) {
        let (x, y, z) = self.pos(controller);
        x.ser(writer);
        y.ser(writer);
        z.ser(writer);
    }

    fn apply_epoch_state(&mut self, controller: HostEntity, blend: f32, from: &[u8], to: &[u8]) {
        let Some(from) = decode_pos(from) else { return };
        let Some(to) = decode_pos(to) else { return };

        let lerp = |a: f32, b: f32| a + (b - a) * blend;
        self.set(
            controller,
            "pos",
            TestValue::Vec3(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2)),
        );
    }

    fn iterations_per_second(&self) -> f32 {
        self.iterations_per_second
    }
}

fn decode_pos(bytes: &[u8]) -> Option<(f32, f32, f32)> {
    let mut reader = BitReader::new(bytes);
    Some((
        f32::de(&mut reader).ok()?,
        f32::de(&mut reader).ok()?,
        f32::de(&mut reader).ok()?,
    ))
}
