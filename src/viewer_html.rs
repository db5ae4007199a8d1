pub const HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Arch Landmark Viewer</title>
  <style>
    body {
      margin: 0;
      padding: 0;
      overflow: hidden;
      background-color: #111827;
      color: #e5e7eb;
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    }
    #canvas-container {
      width: 100vw;
      height: 100vh;
    }
    #panel {
      position: absolute;
      top: 20px;
      left: 20px;
      background-color: rgba(31, 41, 55, 0.92);
      padding: 15px;
      border-radius: 8px;
      width: 280px;
      max-height: calc(100vh - 70px);
      overflow-y: auto;
      font-size: 13px;
    }
    #panel.hidden {
      display: none;
    }
    .panel-header {
      font-weight: bold;
      margin: 12px 0 8px 0;
      padding-bottom: 6px;
      border-bottom: 1px solid #4b5563;
      font-size: 12px;
      color: #9ca3af;
    }
    .panel-header:first-child {
      margin-top: 0;
    }
    .drop-zone {
      border: 2px dashed #4b5563;
      border-radius: 6px;
      padding: 10px;
      margin-bottom: 8px;
      cursor: pointer;
      transition: border-color 0.15s, background-color 0.15s;
    }
    .drop-zone.dragover {
      border-color: #8ac6ff;
      background-color: rgba(100, 150, 255, 0.15);
    }
    .drop-zone .slot-name {
      font-weight: bold;
    }
    .drop-zone .file-name {
      font-family: monospace;
      color: #9ca3af;
      overflow: hidden;
      text-overflow: ellipsis;
      white-space: nowrap;
    }
    button {
      width: 100%;
      padding: 6px;
      border: none;
      border-radius: 4px;
      background-color: #3b82f6;
      color: white;
      cursor: pointer;
    }
    button:disabled {
      background-color: #4b5563;
      cursor: default;
    }
    #upload-status {
      margin-top: 6px;
      min-height: 1em;
      color: #fca5a5;
    }
    .toggle {
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 3px 0;
    }
    .swatch {
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 50%;
      margin-right: 6px;
    }
    .legend-group h4 {
      margin: 8px 0 4px 0;
      font-size: 12px;
    }
    .legend-entry {
      padding: 1px 0;
      font-size: 12px;
    }
    .legend-entry.prep {
      font-weight: bold;
    }
    #help-overlay {
      position: absolute;
      top: 20px;
      right: 20px;
      background-color: rgba(0, 0, 0, 0.6);
      padding: 10px 14px;
      border-radius: 8px;
      font-size: 12px;
      color: #d1d5db;
    }
  </style>
</head>
<body>
  <div id="canvas-container"></div>

  <div id="panel">
    <div class="panel-header">Upload (Tab to toggle panel)</div>
    <div class="drop-zone" data-slot="0">
      <div class="slot-name" style="color: #3b82f6">Mesh File 1</div>
      <div class="file-name">Drop an STL file or click</div>
      <input type="file" accept=".stl" hidden>
    </div>
    <div class="drop-zone" data-slot="1">
      <div class="slot-name" style="color: #10b981">Mesh File 2</div>
      <div class="file-name">Drop an STL file or click</div>
      <input type="file" accept=".stl" hidden>
    </div>
    <button id="submit" disabled>Submit</button>
    <div id="upload-status"></div>

    <div class="panel-header">View</div>
    <div id="toggles"></div>

    <div class="panel-header">Landmarks <span id="session-id"></span></div>
    <div id="legend"></div>
  </div>

  <div id="help-overlay">
    Drag: rotate &middot; Right drag: pan &middot; Scroll: zoom<br>
    1 / 2: meshes &middot; m: markers &middot; g: grid &middot; f: frame &middot; r: reload
  </div>

  <script type="importmap">
  {
    "imports": {
      "three": "https://cdn.jsdelivr.net/npm/three@0.160.0/build/three.module.js",
      "three/addons/": "https://cdn.jsdelivr.net/npm/three@0.160.0/examples/jsm/"
    }
  }
  </script>

  <script type="module">
    import * as THREE from 'three';
    import { OrbitControls } from 'three/addons/controls/OrbitControls.js';
    import { STLLoader } from 'three/addons/loaders/STLLoader.js';

    const scene = new THREE.Scene();
    scene.background = new THREE.Color(0x111827);

    const camera = new THREE.PerspectiveCamera(
      50,
      window.innerWidth / window.innerHeight,
      0.1,
      2000
    );
    const initialCameraPosition = new THREE.Vector3(60, 60, 60);
    const initialCameraTarget = new THREE.Vector3(0, 0, 0);
    camera.position.copy(initialCameraPosition);
    camera.lookAt(initialCameraTarget);

    const renderer = new THREE.WebGLRenderer({ antialias: true });
    renderer.setSize(window.innerWidth, window.innerHeight);
    renderer.setPixelRatio(window.devicePixelRatio);
    document.getElementById('canvas-container').appendChild(renderer.domElement);

    scene.add(new THREE.AmbientLight(0xffffff, 0.4));
    const keyLight = new THREE.DirectionalLight(0xffffff, 1.0);
    keyLight.position.set(10, 15, 10);
    scene.add(keyLight);
    const fillLight = new THREE.DirectionalLight(0xffffff, 0.5);
    fillLight.position.set(-10, -15, -10);
    scene.add(fillLight);

    const gridHelper = new THREE.GridHelper(100, 20, 0x666666, 0x444444);
    scene.add(gridHelper);

    const controls = new OrbitControls(camera, renderer.domElement);

    // View state: the only thing toggles change. Everything drawn is
    // derived from (session, viewState) in render().
    const viewState = {
      meshes: { mesh1: true, mesh2: true },
      markers: true,
      grid: true,
      panel: true,
    };

    let session = null;
    const stlLoader = new STLLoader();
    const loadedMeshes = new Map();   // tag -> { file, object }
    const markerGroup = new THREE.Group();
    scene.add(markerGroup);

    function loadSTL(tag, filename, tint) {
      const existing = loadedMeshes.get(tag);
      if (existing && existing.file === filename) {
        return;
      }
      disposeMesh(tag);
      loadedMeshes.set(tag, { file: filename, object: null });

      stlLoader.load(
        `/scene/${encodeURIComponent(filename)}`,
        (geometry) => {
          const entry = loadedMeshes.get(tag);
          if (!entry || entry.file !== filename) {
            geometry.dispose();
            return;
          }
          geometry.computeVertexNormals();
          const material = new THREE.MeshStandardMaterial({
            color: tint,
            metalness: 0.3,
            roughness: 0.2,
            emissive: new THREE.Color(tint).multiplyScalar(0.1),
            side: THREE.DoubleSide,
            transparent: true,
            opacity: 0.85,
          });
          entry.object = new THREE.Mesh(geometry, material);
          scene.add(entry.object);
          console.log(`Loaded: ${filename}`);
          render();
          frameVisible(camera.position.clone().sub(controls.target));
        },
        undefined,
        (error) => {
          console.error(`Error loading ${filename}:`, error);
          document.getElementById('upload-status').textContent = `Could not load ${filename}`;
        }
      );
    }

    function disposeMesh(tag) {
      const entry = loadedMeshes.get(tag);
      if (entry && entry.object) {
        scene.remove(entry.object);
        entry.object.geometry.dispose();
        entry.object.material.dispose();
      }
      loadedMeshes.delete(tag);
    }

    function clearMarkers() {
      markerGroup.children.slice().forEach((child) => {
        markerGroup.remove(child);
        child.geometry.dispose();
        child.material.dispose();
      });
    }

    // Redraw markers, legend and toggles from the session under viewState.
    function render() {
      gridHelper.visible = viewState.grid;
      document.getElementById('panel').classList.toggle('hidden', !viewState.panel);

      loadedMeshes.forEach((entry, tag) => {
        if (entry.object) {
          entry.object.visible = viewState.meshes[tag] !== false;
        }
      });

      clearMarkers();
      if (!session) return;

      if (viewState.markers) {
        session.markers
          .filter((m) => viewState.meshes[m.source_mesh] !== false)
          .forEach((m) => {
            const sphere = new THREE.Mesh(
              new THREE.SphereGeometry(m.radius, 16, 16),
              new THREE.MeshStandardMaterial({
                color: m.color,
                emissive: m.color,
                emissiveIntensity: m.prep ? 0.6 : 0.3,
              })
            );
            sphere.position.set(m.position[0], m.position[1], m.position[2]);
            markerGroup.add(sphere);
          });
      }

      renderToggles();
      renderLegend();
    }

    function renderToggles() {
      const toggles = document.getElementById('toggles');
      toggles.innerHTML = '';
      const rows = session.meshes.map((mesh) => ({
        label: mesh.label,
        color: mesh.color,
        checked: viewState.meshes[mesh.tag] !== false,
        flip: () => { viewState.meshes[mesh.tag] = !(viewState.meshes[mesh.tag] !== false); },
      }));
      rows.push({ label: 'Markers', checked: viewState.markers, flip: () => { viewState.markers = !viewState.markers; } });
      rows.push({ label: 'Grid', checked: viewState.grid, flip: () => { viewState.grid = !viewState.grid; } });

      rows.forEach((row) => {
        const item = document.createElement('label');
        item.className = 'toggle';
        const text = document.createElement('span');
        if (row.color) {
          const swatch = document.createElement('span');
          swatch.className = 'swatch';
          swatch.style.backgroundColor = row.color;
          text.appendChild(swatch);
        }
        text.appendChild(document.createTextNode(row.label));
        const input = document.createElement('input');
        input.type = 'checkbox';
        input.checked = row.checked;
        input.addEventListener('change', () => { row.flip(); render(); });
        item.appendChild(text);
        item.appendChild(input);
        toggles.appendChild(item);
      });
    }

    function renderLegend() {
      document.getElementById('session-id').textContent = session.id ? `(${session.id.slice(0, 8)})` : '';
      const legend = document.getElementById('legend');
      legend.innerHTML = '';
      session.legend.forEach((group) => {
        const block = document.createElement('div');
        block.className = 'legend-group';
        const title = document.createElement('h4');
        title.style.color = group.tint;
        title.textContent = group.label;
        block.appendChild(title);
        if (group.entries.length === 0) {
          const empty = document.createElement('div');
          empty.className = 'legend-entry';
          empty.style.color = '#888';
          empty.textContent = 'No landmarks';
          block.appendChild(empty);
        }
        group.entries.forEach((entry) => {
          const row = document.createElement('div');
          row.className = entry.prep ? 'legend-entry prep' : 'legend-entry';
          const swatch = document.createElement('span');
          swatch.className = 'swatch';
          swatch.style.backgroundColor = entry.color;
          row.appendChild(swatch);
          row.appendChild(document.createTextNode(
            `Tooth ${entry.notation_number}${entry.prep ? ' (prep)' : ''}`
          ));
          block.appendChild(row);
        });
        legend.appendChild(block);
      });
    }

    async function loadSession() {
      try {
        const response = await fetch('/api/session');
        applySession(await response.json());
      } catch (error) {
        console.error('Error loading session:', error);
      }
    }

    function applySession(next) {
      session = next;
      session.meshes.forEach((mesh) => {
        if (!(mesh.tag in viewState.meshes)) {
          viewState.meshes[mesh.tag] = true;
        }
        if (mesh.file) {
          loadSTL(mesh.tag, mesh.file, mesh.color);
        }
      });
      render();
    }

    function reloadAll() {
      Array.from(loadedMeshes.keys()).forEach(disposeMesh);
      loadSession();
    }

    // Upload panel
    const pendingFiles = [null, null];
    const submitButton = document.getElementById('submit');

    function setPending(slot, file, zone) {
      if (!file || !file.name.toLowerCase().endsWith('.stl')) {
        document.getElementById('upload-status').textContent = 'Only .stl files are accepted';
        return;
      }
      pendingFiles[slot] = file;
      zone.querySelector('.file-name').textContent = file.name;
      document.getElementById('upload-status').textContent = '';
      submitButton.disabled = !(pendingFiles[0] && pendingFiles[1]);
    }

    document.querySelectorAll('.drop-zone').forEach((zone) => {
      const slot = Number(zone.dataset.slot);
      const input = zone.querySelector('input');
      zone.addEventListener('click', () => input.click());
      input.addEventListener('change', () => setPending(slot, input.files[0], zone));
      zone.addEventListener('dragover', (event) => {
        event.preventDefault();
        zone.classList.add('dragover');
      });
      zone.addEventListener('dragleave', () => zone.classList.remove('dragover'));
      zone.addEventListener('drop', (event) => {
        event.preventDefault();
        zone.classList.remove('dragover');
        setPending(slot, event.dataTransfer.files[0], zone);
      });
    });

    submitButton.addEventListener('click', async () => {
      const form = new FormData();
      form.append('mesh1', pendingFiles[0]);
      form.append('mesh2', pendingFiles[1]);
      submitButton.disabled = true;
      submitButton.textContent = 'Processing...';
      try {
        const response = await fetch('/api/upload', { method: 'POST', body: form });
        const body = await response.json();
        if (!response.ok) {
          throw new Error(body.error || `HTTP ${response.status}`);
        }
        document.getElementById('upload-status').textContent = '';
        applySession(body);
      } catch (error) {
        console.error('Error submitting files:', error);
        document.getElementById('upload-status').textContent = error.message;
      } finally {
        submitButton.textContent = 'Submit';
        submitButton.disabled = !(pendingFiles[0] && pendingFiles[1]);
      }
    });

    // Frame visible meshes (or markers when no mesh is loaded).
    function frameVisible(direction) {
      const box = new THREE.Box3();
      loadedMeshes.forEach((entry) => {
        if (entry.object && entry.object.visible) {
          box.union(new THREE.Box3().setFromObject(entry.object));
        }
      });
      if (box.isEmpty() && markerGroup.children.length > 0) {
        box.setFromObject(markerGroup);
      }
      if (box.isEmpty()) return;

      const center = box.getCenter(new THREE.Vector3());
      const size = box.getSize(new THREE.Vector3());
      const maxDim = Math.max(size.x, size.y, size.z);
      const fov = camera.fov * (Math.PI / 180);
      const cameraDistance = Math.abs(maxDim / Math.sin(fov / 2)) * 1.25;

      const offset = direction.clone().normalize().multiplyScalar(cameraDistance);
      camera.position.copy(center).add(offset);
      controls.target.copy(center);
      controls.update();
    }

    window.addEventListener('keydown', (event) => {
      if (event.target instanceof HTMLInputElement) return;
      switch (event.key) {
        case '0':
          camera.position.copy(initialCameraPosition);
          controls.target.copy(initialCameraTarget);
          controls.update();
          break;
        case '1':
          viewState.meshes.mesh1 = !viewState.meshes.mesh1;
          render();
          break;
        case '2':
          viewState.meshes.mesh2 = !viewState.meshes.mesh2;
          render();
          break;
        case 'm':
        case 'M':
          viewState.markers = !viewState.markers;
          render();
          break;
        case 'g':
        case 'G':
          viewState.grid = !viewState.grid;
          render();
          break;
        case 'f':
        case 'F':
          frameVisible(camera.position.clone().sub(controls.target));
          break;
        case 'r':
        case 'R':
          reloadAll();
          break;
        case 'Tab':
          event.preventDefault();
          viewState.panel = !viewState.panel;
          render();
          break;
      }
    });

    loadSession();

    function connectWebSocket() {
      const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
      const ws = new WebSocket(`${protocol}//${window.location.host}/ws`);

      ws.onopen = () => {
        console.log('WebSocket connected - live updates enabled');
      };

      ws.onmessage = (event) => {
        const msg = JSON.parse(event.data);
        console.log('Viewer event:', msg);

        switch (msg.type) {
          case 'landmarks_updated':
          case 'meshes_uploaded':
            loadSession();
            break;
          case 'file_modified':
          case 'file_removed':
            loadedMeshes.forEach((entry, tag) => {
              if (entry.file === msg.filename) {
                disposeMesh(tag);
              }
            });
            loadSession();
            break;
          case 'file_added':
            loadSession();
            break;
        }
      };

      ws.onerror = (error) => {
        console.error('WebSocket error:', error);
      };

      ws.onclose = () => {
        console.log('WebSocket disconnected - reconnecting in 2s...');
        setTimeout(connectWebSocket, 2000);
      };
    }

    connectWebSocket();

    window.addEventListener('resize', () => {
      camera.aspect = window.innerWidth / window.innerHeight;
      camera.updateProjectionMatrix();
      renderer.setSize(window.innerWidth, window.innerHeight);
    });

    function animate() {
      requestAnimationFrame(animate);
      controls.update();
      renderer.render(scene, camera);
    }

    animate();

    console.log('Arch Landmark Viewer initialized');
  </script>
</body>
</html>"##;
