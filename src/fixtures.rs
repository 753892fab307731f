use crate::model::{Muscle, Workout};

pub(crate) fn muscle(name: &str) -> Muscle {
    Muscle {
        name: Some(name.to_string()),
        ..Muscle::default()
    }
}

pub(crate) fn workout(id: i64, primary: &[&str], secondary: &[&str]) -> Workout {
    Workout {
        id,
        name: format!("workout-{id}"),
        aliases: Vec::new(),
        uuid: None,
        exercise_base_id: None,
        description: None,
        created: None,
        category: None,
        muscles: primary.iter().map(|name| muscle(name)).collect(),
        muscles_secondary: secondary.iter().map(|name| muscle(name)).collect(),
        equipment: Vec::new(),
        language: None,
        license: None,
        license_author: None,
        images: Vec::new(),
        videos: Vec::new(),
        comments: Vec::new(),
        variations: Vec::new(),
        author_history: Vec::new(),
    }
}

pub(crate) const SAMPLE_CATALOG: &str = r#"[
  {
    "id": 74,
    "name": "Biceps Curls With Dumbbell",
    "uuid": "ad4c2c8b-0c54-4e0b-b2b4-7f3e4b4b1c11",
    "category": {"id": 8, "name": "Arms"},
    "muscles": [
      {"id": 1, "name": "Biceps brachii", "name_en": "Biceps", "is_front": true}
    ],
    "muscles_secondary": [{"id": 13, "name": "Brachialis"}],
    "equipment": [{"id": 3, "name": "Dumbbell"}]
  },
  {
    "id": 83,
    "name": "Close-grip Bench Press",
    "created": "2023-04-01T10:00:00Z",
    "muscles": [
      {"id": 5, "name": "Triceps brachii", "name_en": "Triceps", "is_front": false}
    ],
    "muscles_secondary": [{"id": 4, "name": "Pectoralis major", "name_en": "Chest"}]
  },
  {
    "id": 91,
    "name": "Chin-ups",
    "muscles": [
      {"id": 12, "name": "Latissimus dorsi", "name_en": "Lats"},
      {"id": 1, "name": "Biceps brachii", "name_en": "Biceps"}
    ],
    "muscles_secondary": [{"id": 5, "name": "Triceps brachii"}]
  },
  {
    "id": 111,
    "name": "Squats",
    "muscles": [
      {"id": 10, "name": "Quadriceps femoris", "name_en": "Quads"}
    ]
  }
]"#;
